//! Keyframe tracks for animating node transforms.

use super::interpolant::{InterpolationMode, TrackValue};
use crate::math::{Quat, Vec3};

/// Node transform property a track drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackProperty {
    /// Local translation.
    Translation,
    /// Local rotation.
    Rotation,
    /// Local scale.
    Scale,
}

impl TrackProperty {
    /// Property name used in binding paths (`"Hips.quaternion"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackProperty::Translation => "position",
            TrackProperty::Rotation => "quaternion",
            TrackProperty::Scale => "scale",
        }
    }

    /// Parse a property name. Accepts both scene-graph and glTF spellings.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "position" | "translation" => Some(Self::Translation),
            "quaternion" | "rotation" => Some(Self::Rotation),
            "scale" => Some(Self::Scale),
            _ => None,
        }
    }
}

/// Split a binding path `"<node>.<property>"`. Node names may contain dots.
pub fn parse_binding(path: &str) -> Option<(&str, TrackProperty)> {
    let (node, property) = path.rsplit_once('.')?;
    Some((node, TrackProperty::parse(property)?))
}

/// Track of keyframed values.
///
/// For [`InterpolationMode::CubicSpline`] each keyframe stores three values:
/// in-tangent, value, out-tangent.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTrack<T: TrackValue> {
    /// Binding path, `"<node>.<property>"`.
    pub name: String,
    times: Vec<f32>,
    values: Vec<T>,
    /// Interpolation mode.
    pub interpolation: InterpolationMode,
}

/// Track for animating translation or scale.
pub type VectorTrack = KeyframeTrack<Vec3>;

/// Track for animating rotation.
pub type QuaternionTrack = KeyframeTrack<Quat>;

impl<T: TrackValue> KeyframeTrack<T> {
    /// Create from times and values (linear interpolation).
    ///
    /// Times must be ascending. Extra values or times are dropped.
    pub fn from_arrays(name: impl Into<String>, times: Vec<f32>, values: Vec<T>) -> Self {
        Self::with_interpolation(name, times, values, InterpolationMode::Linear)
    }

    /// Create from times and values with an interpolation mode.
    pub fn with_interpolation(
        name: impl Into<String>,
        mut times: Vec<f32>,
        mut values: Vec<T>,
        interpolation: InterpolationMode,
    ) -> Self {
        let stride = if interpolation == InterpolationMode::CubicSpline { 3 } else { 1 };
        let keys = times.len().min(values.len() / stride);
        times.truncate(keys);
        values.truncate(keys * stride);
        Self {
            name: name.into(),
            times,
            values,
            interpolation,
        }
    }

    /// Keyframe times.
    #[inline]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    /// Number of keyframes.
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the track has no keyframes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Get the duration of this track.
    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    fn value(&self, key: usize) -> T {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.values[key * 3 + 1],
            _ => self.values[key],
        }
    }

    /// Sample the track at a given time. Times outside the keyframes clamp.
    pub fn sample(&self, time: f32) -> T {
        let Some(&first) = self.times.first() else {
            return T::IDENTITY;
        };
        let last = self.times.len() - 1;
        if last == 0 || time <= first {
            return self.value(0);
        }
        if time >= self.times[last] {
            return self.value(last);
        }

        let k1 = self.times.partition_point(|&t| t <= time);
        let k0 = k1 - 1;
        let dt = self.times[k1] - self.times[k0];
        if dt <= 0.0 {
            return self.value(k1);
        }
        let t = (time - self.times[k0]) / dt;

        match self.interpolation {
            InterpolationMode::Step => self.value(k0),
            InterpolationMode::Linear => T::interpolate(self.value(k0), self.value(k1), t),
            InterpolationMode::CubicSpline => {
                let out_tangent = self.values[k0 * 3 + 2];
                let in_tangent = self.values[k1 * 3];
                T::hermite(
                    self.value(k0),
                    out_tangent.scale(dt),
                    self.value(k1),
                    in_tangent.scale(dt),
                    t,
                )
            }
        }
    }
}

/// A track of either value kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Track {
    /// Translation or scale.
    Vector(VectorTrack),
    /// Rotation.
    Quaternion(QuaternionTrack),
}

impl Track {
    /// Get the binding path.
    pub fn name(&self) -> &str {
        match self {
            Track::Vector(t) => &t.name,
            Track::Quaternion(t) => &t.name,
        }
    }

    /// Get the duration of this track.
    pub fn duration(&self) -> f32 {
        match self {
            Track::Vector(t) => t.duration(),
            Track::Quaternion(t) => t.duration(),
        }
    }

    /// Target node name and property, if the path is well formed.
    pub fn binding(&self) -> Option<(&str, TrackProperty)> {
        parse_binding(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> VectorTrack {
        VectorTrack::from_arrays(
            "Hips.position",
            vec![0.0, 1.0, 2.0],
            vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 0.0)],
        )
    }

    #[test]
    fn test_sample_linear_and_clamped() {
        let t = track();
        assert_eq!(t.sample(-1.0), Vec3::ZERO);
        assert_eq!(t.sample(0.5), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(t.sample(1.5), Vec3::new(10.0, 5.0, 0.0));
        assert_eq!(t.sample(9.0), Vec3::new(10.0, 10.0, 0.0));
        assert_eq!(t.duration(), 2.0);
    }

    #[test]
    fn test_sample_step() {
        let mut t = track();
        t.interpolation = InterpolationMode::Step;
        assert_eq!(t.sample(0.99), Vec3::ZERO);
        assert_eq!(t.sample(1.0), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_cubic_spline_hits_keys() {
        let values = vec![
            Vec3::ZERO, Vec3::ZERO, Vec3::ONE,
            Vec3::ONE, Vec3::splat(4.0), Vec3::ONE,
        ];
        let t = VectorTrack::with_interpolation(
            "a.scale",
            vec![0.0, 2.0],
            values,
            InterpolationMode::CubicSpline,
        );
        assert_eq!(t.sample(0.0), Vec3::ZERO);
        assert_eq!(t.sample(2.0), Vec3::splat(4.0));
        let mid = t.sample(1.0);
        assert!(mid.x > 0.0 && mid.x < 4.0);
    }

    #[test]
    fn test_mismatched_lengths_truncate() {
        let t = VectorTrack::from_arrays("a.position", vec![0.0, 1.0, 2.0], vec![Vec3::ONE]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.sample(5.0), Vec3::ONE);
        let empty = QuaternionTrack::from_arrays("a.quaternion", vec![], vec![]);
        assert!(empty.is_empty());
        assert_eq!(empty.sample(1.0), Quat::IDENTITY);
    }

    #[test]
    fn test_parse_binding() {
        assert_eq!(
            parse_binding("mixamorig:Hips.quaternion"),
            Some(("mixamorig:Hips", TrackProperty::Rotation))
        );
        assert_eq!(parse_binding("a.b.translation"), Some(("a.b", TrackProperty::Translation)));
        assert_eq!(parse_binding("nodot"), None);
        assert_eq!(parse_binding("a.weights"), None);
    }
}
