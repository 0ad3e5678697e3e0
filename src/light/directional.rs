//! Directional light (sun-like parallel rays).

use crate::camera::OrthographicCamera;
use crate::math::{Color, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Shadow map settings of a directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadow {
    /// Orthographic volume the shadow map covers, in light space.
    pub camera: OrthographicCamera,
    /// Shadow map resolution (square).
    pub map_size: u32,
    /// Depth bias to prevent shadow acne.
    pub bias: f32,
}

impl Default for DirectionalShadow {
    fn default() -> Self {
        Self {
            camera: OrthographicCamera::default(),
            map_size: 512,
            bias: 0.0,
        }
    }
}

/// Directional light emitting parallel rays from its position towards
/// `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Light color.
    pub color: Color,
    /// Light intensity.
    pub intensity: f32,
    /// World-space point the light shines at.
    pub target: Vec3,
    /// Shadow map settings, used when the node casts shadows.
    pub shadow: DirectionalShadow,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(0xffffff, 1.0)
    }
}

impl DirectionalLight {
    /// Create a new directional light aimed at the origin.
    pub fn new(color: impl Into<Color>, intensity: f32) -> Self {
        Self {
            color: color.into(),
            intensity,
            target: Vec3::ZERO,
            shadow: DirectionalShadow::default(),
        }
    }

    /// Builder-style shadow settings.
    pub fn with_shadow(mut self, shadow: DirectionalShadow) -> Self {
        self.shadow = shadow;
        self
    }

    /// Unit vector from the target towards a light placed at `position`.
    pub fn direction_from(&self, position: Vec3) -> Vec3 {
        let dir = (position - self.target).normalize_or_zero();
        if dir == Vec3::ZERO {
            Vec3::Y
        } else {
            dir
        }
    }

    /// Light-space view-projection used to render and sample the shadow map.
    pub fn shadow_matrix(&self, position: Vec3) -> Mat4 {
        self.shadow
            .camera
            .view_projection_matrix(position, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_points_at_light() {
        let light = DirectionalLight::new(0xffffff, 1.0);
        let dir = light.direction_from(Vec3::new(0.0, 200.0, 0.0));
        assert_eq!(dir, Vec3::Y);
        assert_eq!(light.direction_from(Vec3::ZERO), Vec3::Y);
    }

    #[test]
    fn test_shadow_matrix_covers_origin() {
        let mut light = DirectionalLight::new(0xffffff, 1.0);
        light.shadow.camera = OrthographicCamera::new(-120.0, 120.0, 180.0, -100.0, 0.5, 500.0);
        let p = light
            .shadow_matrix(Vec3::new(0.0, 200.0, 100.0))
            .project_point3(Vec3::new(50.0, 0.0, 50.0));
        assert!(p.x.abs() < 1.0 && p.y.abs() < 1.0 && p.z > 0.0 && p.z < 1.0);
    }
}
