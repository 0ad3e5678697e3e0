//! Animation system for keyframe-based animations.
//!
//! Tracks animate node translations, rotations and scales by name; the mixer
//! blends playing actions and writes the pose into a node hierarchy. Skinned
//! meshes follow their joints through CPU skinning.

mod animation_action;
mod animation_clip;
mod animation_mixer;
mod interpolant;
mod keyframe_track;
mod skinning;

pub use animation_action::*;
pub use animation_clip::*;
pub use animation_mixer::*;
pub use interpolant::{InterpolationMode, TrackValue};
pub use keyframe_track::*;
pub use skinning::{skin_vertices, Skin};
