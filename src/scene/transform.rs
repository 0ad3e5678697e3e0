//! Local transform of a scene node.

use crate::math::{Mat4, Quat, Vec3};

/// Translation, rotation and scale of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Local position.
    pub translation: Vec3,
    /// Local rotation.
    pub rotation: Quat,
    /// Local scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new identity transform.
    #[inline]
    pub fn new() -> Self {
        Self::IDENTITY
    }

    /// Create a transform from position.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Decompose an affine matrix.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Set position.
    #[inline]
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.translation = Vec3::new(x, y, z);
    }

    /// Set rotation from Euler angles in radians, XYZ order.
    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(glam::EulerRot::XYZ, x, y, z);
    }

    /// Rotate around the local X axis.
    #[inline]
    pub fn rotate_x(&mut self, angle: f32) {
        self.rotation *= Quat::from_rotation_x(angle);
    }

    /// Rotate around the local Y axis.
    #[inline]
    pub fn rotate_y(&mut self, angle: f32) {
        self.rotation *= Quat::from_rotation_y(angle);
    }

    /// Local transformation matrix.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotate_x_lays_plane_flat() {
        let mut t = Transform::new();
        t.rotate_x(-FRAC_PI_2);
        let normal = t.matrix().transform_vector3(Vec3::Z);
        assert!((normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_matrix_roundtrip() {
        let mut t = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        t.rotate_y(0.5);
        t.scale = Vec3::splat(2.0);
        let back = Transform::from_matrix(t.matrix());
        assert!((back.translation - t.translation).length() < 1e-5);
        assert!((back.scale - t.scale).length() < 1e-5);
        assert!(back.rotation.angle_between(t.rotation) < 1e-4);
    }
}
