//! Ambient light for global illumination.

use crate::math::Color;

/// Ambient light that illuminates all objects equally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    /// Light color.
    pub color: Color,
    /// Light intensity.
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self::new(0xffffff, 1.0)
    }
}

impl AmbientLight {
    /// Create a new ambient light.
    pub fn new(color: impl Into<Color>, intensity: f32) -> Self {
        Self {
            color: color.into(),
            intensity,
        }
    }

    /// Get the effective color (color * intensity).
    pub fn effective_color(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}
