//! Orthographic camera.

use crate::math::{Mat4, Vec3, UP};
use serde::{Deserialize, Serialize};

/// An orthographic projection volume, used for directional light shadows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrthographicCamera {
    /// Left plane.
    pub left: f32,
    /// Right plane.
    pub right: f32,
    /// Top plane.
    pub top: f32,
    /// Bottom plane.
    pub bottom: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Default for OrthographicCamera {
    fn default() -> Self {
        Self::new(-5.0, 5.0, 5.0, -5.0, 0.5, 500.0)
    }
}

impl OrthographicCamera {
    /// Create a new orthographic camera.
    pub fn new(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
            near,
            far,
        }
    }

    /// Projection matrix (depth mapped to 0..1).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }

    /// View-projection matrix for a camera at `position` looking at `target`.
    pub fn view_projection_matrix(&self, position: Vec3, target: Vec3) -> Mat4 {
        let dir = (target - position).normalize_or_zero();
        // Looking straight down the up axis needs a different up vector.
        let up = if dir.cross(UP).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            UP
        };
        self.projection_matrix() * Mat4::look_at_rh(position, target, up)
    }
}
