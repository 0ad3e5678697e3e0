//! Animation action - a single animation instance.

use super::AnimationClip;
use std::sync::Arc;

/// Loop mode for animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Play once and stop.
    Once,
    /// Loop continuously.
    #[default]
    Loop,
    /// Ping-pong (forward then backward).
    PingPong,
}

/// State of an animation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    /// Not playing.
    #[default]
    Stopped,
    /// Currently playing.
    Playing,
    /// Paused.
    Paused,
}

/// An animation action controls playback of an animation clip.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,
    time: f32,
    /// Playback speed multiplier (1.0 = normal, 2.0 = double speed).
    pub time_scale: f32,
    /// Weight for blending (0.0 - 1.0).
    pub weight: f32,
    /// Loop mode.
    pub loop_mode: LoopMode,
    /// Number of repetitions (0 = infinite).
    pub repetitions: u32,
    /// Hold the last frame when a `Once` action finishes.
    pub clamp_when_finished: bool,
    current_repetition: u32,
    state: ActionState,
    is_reversed: bool,
}

impl AnimationAction {
    /// Create a new, stopped animation action for a clip.
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::default(),
            repetitions: 0,
            clamp_when_finished: false,
            current_repetition: 0,
            state: ActionState::Stopped,
            is_reversed: false,
        }
    }

    /// Get the animation clip.
    #[inline]
    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Shared handle to the clip.
    #[inline]
    pub fn clip_arc(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    /// Get the local playback time.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Set the local playback time.
    pub fn set_time(&mut self, time: f32) {
        self.time = time.clamp(0.0, self.clip.duration());
    }

    /// Get the current state.
    #[inline]
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Check if playing.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == ActionState::Playing
    }

    /// Whether the action contributes to the pose.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state != ActionState::Stopped || (self.clamp_when_finished && self.time > 0.0)
    }

    /// Start playing the animation.
    pub fn play(&mut self) -> &mut Self {
        self.state = ActionState::Playing;
        self
    }

    /// Stop the animation and reset to start.
    pub fn stop(&mut self) -> &mut Self {
        self.state = ActionState::Stopped;
        self.reset();
        self
    }

    /// Pause the animation.
    pub fn pause(&mut self) {
        if self.state == ActionState::Playing {
            self.state = ActionState::Paused;
        }
    }

    /// Resume from pause.
    pub fn resume(&mut self) {
        if self.state == ActionState::Paused {
            self.state = ActionState::Playing;
        }
    }

    /// Reset to the beginning.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.current_repetition = 0;
        self.is_reversed = false;
    }

    fn finish(&mut self, time: f32) {
        self.state = ActionState::Stopped;
        self.time = if self.clamp_when_finished { time } else { 0.0 };
    }

    /// Advance by delta time (already scaled by the mixer).
    /// Returns true if the animation is still playing.
    pub fn update(&mut self, delta_time: f32) -> bool {
        if self.state != ActionState::Playing {
            return false;
        }

        let duration = self.clip.duration();
        if duration <= 0.0 {
            return true;
        }

        let direction = if self.is_reversed { -1.0 } else { 1.0 };
        self.time += delta_time * self.time_scale * direction;

        match self.loop_mode {
            LoopMode::Once => {
                if self.time >= duration {
                    self.finish(duration);
                    return false;
                }
                if self.time < 0.0 {
                    self.finish(0.0);
                    return false;
                }
            }
            LoopMode::Loop => {
                if self.time >= duration || self.time < 0.0 {
                    let wraps = (self.time / duration).floor().abs() as u32;
                    self.time = self.time.rem_euclid(duration);
                    self.current_repetition += wraps.max(1);
                    if self.repetitions > 0 && self.current_repetition >= self.repetitions {
                        self.finish(duration);
                        return false;
                    }
                }
            }
            LoopMode::PingPong => {
                if !self.is_reversed && self.time >= duration {
                    self.time = (2.0 * duration - self.time).max(0.0);
                    self.is_reversed = true;
                } else if self.is_reversed && self.time <= 0.0 {
                    self.time = (-self.time).min(duration);
                    self.is_reversed = false;
                    self.current_repetition += 1;
                    if self.repetitions > 0 && self.current_repetition >= self.repetitions {
                        self.finish(0.0);
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Get normalized time (0-1).
    pub fn normalized_time(&self) -> f32 {
        let duration = self.clip.duration();
        if duration <= 0.0 {
            0.0
        } else {
            self.time / duration
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Track, VectorTrack};
    use crate::math::Vec3;

    fn clip(duration: f32) -> Arc<AnimationClip> {
        Arc::new(AnimationClip::from_tracks(
            "clip",
            vec![Track::Vector(VectorTrack::from_arrays(
                "a.position",
                vec![0.0, duration],
                vec![Vec3::ZERO, Vec3::ONE],
            ))],
        ))
    }

    #[test]
    fn test_default_loops() {
        let mut action = AnimationAction::new(clip(1.0));
        assert_eq!(action.loop_mode, LoopMode::Loop);
        action.play();
        assert!(action.update(0.75));
        assert!(action.update(0.5));
        assert!((action.time() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_once_stops_at_end() {
        let mut action = AnimationAction::new(clip(1.0));
        action.loop_mode = LoopMode::Once;
        action.clamp_when_finished = true;
        action.play();
        assert!(!action.update(2.0));
        assert_eq!(action.state(), ActionState::Stopped);
        assert_eq!(action.time(), 1.0);
        assert!(action.is_active());
    }

    #[test]
    fn test_ping_pong_reverses() {
        let mut action = AnimationAction::new(clip(1.0));
        action.loop_mode = LoopMode::PingPong;
        action.play();
        action.update(1.25);
        assert!((action.time() - 0.75).abs() < 1e-6);
        action.update(0.25);
        assert!((action.time() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_paused_does_not_advance() {
        let mut action = AnimationAction::new(clip(1.0));
        action.play();
        action.update(0.25);
        action.pause();
        assert!(!action.update(0.5));
        assert_eq!(action.time(), 0.25);
        action.resume();
        assert!(action.is_playing());
    }

    #[test]
    fn test_repetitions_limit() {
        let mut action = AnimationAction::new(clip(1.0));
        action.repetitions = 2;
        action.play();
        assert!(action.update(1.5));
        assert!(!action.update(1.0));
        assert_eq!(action.state(), ActionState::Stopped);
    }
}
