//! Hemisphere light for sky/ground gradient illumination.

use crate::math::Color;

/// Hemisphere light that illuminates with a gradient between sky and ground colors.
///
/// Surfaces facing the light's position (its "up") receive the sky color,
/// surfaces facing away receive the ground color, and everything in between
/// a blend of both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereLight {
    /// Sky color.
    pub sky_color: Color,
    /// Ground color.
    pub ground_color: Color,
    /// Light intensity.
    pub intensity: f32,
}

impl Default for HemisphereLight {
    fn default() -> Self {
        Self::new(0xffffff, 0xffffff, 1.0)
    }
}

impl HemisphereLight {
    /// Create a new hemisphere light.
    pub fn new(sky_color: impl Into<Color>, ground_color: impl Into<Color>, intensity: f32) -> Self {
        Self {
            sky_color: sky_color.into(),
            ground_color: ground_color.into(),
            intensity,
        }
    }

    /// Irradiance for a surface normal, given the light's up direction.
    pub fn irradiance(&self, normal: crate::math::Vec3, up: crate::math::Vec3) -> Color {
        let weight = 0.5 * normal.dot(up) + 0.5;
        self.ground_color
            .lerp(&self.sky_color, weight)
            .scaled(self.intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_irradiance_blends_by_facing() {
        let light = HemisphereLight::new(0xffffff, 0x000000, 1.0);
        assert_eq!(light.irradiance(Vec3::Y, Vec3::Y), Color::WHITE);
        assert_eq!(light.irradiance(Vec3::NEG_Y, Vec3::Y), Color::BLACK);
        assert_eq!(light.irradiance(Vec3::X, Vec3::Y).r, 0.5);
    }
}
