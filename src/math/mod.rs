//! # Math Module
//!
//! The viewer does its vector and matrix work with `glam` directly; this
//! module re-exports the types it uses and adds a three.js-style [`Color`].

mod color;

pub use color::Color;
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// World up direction (Y+).
pub const UP: Vec3 = Vec3::Y;

/// Extract the columns of a matrix in the layout WGSL `mat4x4<f32>` expects.
#[inline]
pub fn mat4_to_array(m: &Mat4) -> [[f32; 4]; 4] {
    m.to_cols_array_2d()
}

/// Normal matrix (inverse-transpose of the upper 3x3) padded to a 4x4.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    let m3 = Mat3::from_mat4(*model);
    if m3.determinant().abs() <= f32::EPSILON {
        return Mat4::IDENTITY;
    }
    Mat4::from_mat3(m3.inverse().transpose())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_matrix_uniform_scale() {
        let model = Mat4::from_scale(Vec3::splat(2.0));
        let n = normal_matrix(&model).transform_vector3(Vec3::Y).normalize();
        assert!((n - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_degenerate() {
        let model = Mat4::from_scale(Vec3::ZERO);
        assert_eq!(normal_matrix(&model), Mat4::IDENTITY);
    }
}
