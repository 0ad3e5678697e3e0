//! Animation clip containing keyframe tracks.

use super::Track;
use crate::core::Id;

/// An animation clip contains multiple tracks that animate node transforms
/// over time.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    id: Id,
    /// Name of the animation.
    pub name: String,
    duration: f32,
    tracks: Vec<Track>,
}

impl AnimationClip {
    /// Create a new empty animation clip.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Id::new(),
            name: name.into(),
            duration: 0.0,
            tracks: Vec::new(),
        }
    }

    /// Create a clip from tracks; the duration is the longest track.
    pub fn from_tracks(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let mut clip = Self::new(name);
        clip.tracks = tracks;
        clip.update_duration();
        clip
    }

    /// Get the unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the duration in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Get the tracks.
    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Add a track to the clip.
    pub fn add_track(&mut self, track: Track) {
        self.duration = self.duration.max(track.duration());
        self.tracks.push(track);
    }

    /// Recalculate duration from all tracks.
    pub fn update_duration(&mut self) {
        self.duration = self.tracks.iter().map(Track::duration).fold(0.0, f32::max);
    }

    /// Find a track by binding path.
    pub fn find_track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name() == name)
    }

    /// Get the number of tracks.
    #[inline]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Check if the clip is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl Default for AnimationClip {
    fn default() -> Self {
        Self::new("Unnamed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::VectorTrack;
    use crate::math::Vec3;

    #[test]
    fn test_duration_is_longest_track() {
        let mut clip = AnimationClip::from_tracks(
            "dance",
            vec![Track::Vector(VectorTrack::from_arrays(
                "a.position",
                vec![0.0, 1.5],
                vec![Vec3::ZERO, Vec3::ONE],
            ))],
        );
        assert_eq!(clip.duration(), 1.5);
        clip.add_track(Track::Vector(VectorTrack::from_arrays(
            "b.scale",
            vec![0.0, 3.0],
            vec![Vec3::ONE, Vec3::ONE],
        )));
        assert_eq!(clip.duration(), 3.0);
        assert!(clip.find_track("b.scale").is_some());
        assert_eq!(clip.track_count(), 2);
    }
}
