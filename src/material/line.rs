//! Line material.

use crate::math::Color;

/// Unlit line appearance. Vertex colors are multiplied by `color`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineBasicMaterial {
    /// Tint applied to vertex colors.
    pub color: Color,
    /// Opacity, used when `transparent` is set.
    pub opacity: f32,
    /// Alpha blend the lines.
    pub transparent: bool,
    /// Write to the depth buffer.
    pub depth_write: bool,
}

impl Default for LineBasicMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            opacity: 1.0,
            transparent: false,
            depth_write: true,
        }
    }
}

impl LineBasicMaterial {
    /// Alpha actually applied when drawing.
    #[inline]
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent {
            self.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}
