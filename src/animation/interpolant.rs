//! Interpolation functions for animation.

use crate::math::{Quat, Vec3};

/// Interpolation mode for keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Linear interpolation between keyframes (slerp for rotations).
    #[default]
    Linear,
    /// Step/discrete - hold the previous keyframe value.
    Step,
    /// Cubic Hermite spline with per-key in/out tangents.
    CubicSpline,
}

/// Cubic Hermite basis weights `(h00, h10, h01, h11)` at `t`.
#[inline]
pub fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    (
        2.0 * t3 - 3.0 * t2 + 1.0,
        t3 - 2.0 * t2 + t,
        -2.0 * t3 + 3.0 * t2,
        t3 - t2,
    )
}

/// A value a keyframe track can interpolate.
pub trait TrackValue: Copy + std::fmt::Debug + PartialEq {
    /// Value used when a track has no keyframes.
    const IDENTITY: Self;

    /// Multiply every component by `s` (tangent scaling).
    fn scale(self, s: f32) -> Self;

    /// Interpolate linearly from `a` to `b`.
    fn interpolate(a: Self, b: Self, t: f32) -> Self;

    /// Hermite spline between `p0` and `p1` with tangents already scaled by
    /// the keyframe interval.
    fn hermite(p0: Self, m0: Self, p1: Self, m1: Self, t: f32) -> Self;
}

impl TrackValue for Vec3 {
    const IDENTITY: Self = Vec3::ZERO;

    fn scale(self, s: f32) -> Self {
        self * s
    }

    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }

    fn hermite(p0: Self, m0: Self, p1: Self, m1: Self, t: f32) -> Self {
        let (h00, h10, h01, h11) = hermite_basis(t);
        p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
    }
}

impl TrackValue for Quat {
    const IDENTITY: Self = Quat::IDENTITY;

    fn scale(self, s: f32) -> Self {
        self * s
    }

    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        a.slerp(b, t)
    }

    fn hermite(p0: Self, m0: Self, p1: Self, m1: Self, t: f32) -> Self {
        let (h00, h10, h01, h11) = hermite_basis(t);
        let v = p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11;
        v.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hermite_endpoints() {
        let p0 = Vec3::ZERO;
        let p1 = Vec3::ONE;
        assert_eq!(Vec3::hermite(p0, Vec3::X, p1, Vec3::X, 0.0), p0);
        assert_eq!(Vec3::hermite(p0, Vec3::X, p1, Vec3::X, 1.0), p1);
    }

    #[test]
    fn test_quat_interpolate_halfway() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let mid = Quat::interpolate(a, b, 0.5);
        assert!(mid.angle_between(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4)) < 1e-4);
    }
}
