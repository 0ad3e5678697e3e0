//! Animation mixer driving the node hierarchy of one model.

use super::{AnimationAction, AnimationClip, Track, TrackProperty};
use crate::core::Id;
use crate::math::{Quat, Vec3};
use crate::scene::Node;
use std::collections::HashMap;
use std::sync::Arc;

/// Blended local pose of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodePose {
    /// Sampled translation, if any track drives it.
    pub translation: Option<Vec3>,
    /// Sampled rotation, if any track drives it.
    pub rotation: Option<Quat>,
    /// Sampled scale, if any track drives it.
    pub scale: Option<Vec3>,
}

/// Result of sampling the mixer: poses keyed by node name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationOutput {
    /// Per-node poses.
    pub poses: HashMap<String, NodePose>,
}

impl AnimationOutput {
    /// Pose of a node, if animated.
    pub fn pose(&self, node: &str) -> Option<&NodePose> {
        self.poses.get(node)
    }

    /// Whether nothing is animated.
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

#[derive(Default)]
struct Accumulator {
    translation: Option<(f32, Vec3)>,
    rotation: Option<(f32, Quat)>,
    scale: Option<(f32, Vec3)>,
}

fn blend_vec3(slot: &mut Option<(f32, Vec3)>, weight: f32, value: Vec3) {
    *slot = Some(match *slot {
        Some((w, v)) => {
            let total = w + weight;
            (total, v.lerp(value, weight / total))
        }
        None => (weight, value),
    });
}

fn blend_quat(slot: &mut Option<(f32, Quat)>, weight: f32, value: Quat) {
    *slot = Some(match *slot {
        Some((w, q)) => {
            let total = w + weight;
            (total, q.slerp(value, weight / total))
        }
        None => (weight, value),
    });
}

/// Animation mixer bound to a model root. Manages actions and blends them.
#[derive(Debug, Clone)]
pub struct AnimationMixer {
    root: Id,
    actions: Vec<AnimationAction>,
    time: f32,
    /// Global time scale.
    pub time_scale: f32,
}

impl AnimationMixer {
    /// Create a mixer for the hierarchy rooted at `root`.
    pub fn new(root: Id) -> Self {
        Self {
            root,
            actions: Vec::new(),
            time: 0.0,
            time_scale: 1.0,
        }
    }

    /// The node this mixer animates.
    #[inline]
    pub fn root(&self) -> Id {
        self.root
    }

    /// Global mixer time in seconds (sum of scaled deltas).
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Return the action for a clip, creating it if needed.
    pub fn clip_action(&mut self, clip: Arc<AnimationClip>) -> &mut AnimationAction {
        let index = match self
            .actions
            .iter()
            .position(|a| Arc::ptr_eq(a.clip_arc(), &clip))
        {
            Some(index) => index,
            None => {
                self.actions.push(AnimationAction::new(clip));
                self.actions.len() - 1
            }
        };
        &mut self.actions[index]
    }

    /// Get all actions.
    #[inline]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    /// Get action by index.
    pub fn action(&self, index: usize) -> Option<&AnimationAction> {
        self.actions.get(index)
    }

    /// Stop all actions.
    pub fn stop_all_action(&mut self) {
        for action in &mut self.actions {
            action.stop();
        }
    }

    /// Check if any animations are playing.
    pub fn is_playing(&self) -> bool {
        self.actions.iter().any(AnimationAction::is_playing)
    }

    /// Advance global time and every playing action. Negative deltas are
    /// treated as zero.
    pub fn update(&mut self, delta_time: f32) {
        let scaled = delta_time.max(0.0) * self.time_scale;
        self.time += scaled;
        for action in &mut self.actions {
            action.update(scaled);
        }
    }

    /// Sample all active actions and blend them by weight.
    pub fn sample(&self) -> AnimationOutput {
        let mut acc: HashMap<&str, Accumulator> = HashMap::new();

        for action in self.actions.iter().filter(|a| a.is_active()) {
            let weight = action.weight;
            if weight <= 0.0 {
                continue;
            }
            let time = action.time();
            for track in action.clip().tracks() {
                let Some((node, property)) = track.binding() else {
                    continue;
                };
                let slot = acc.entry(node).or_default();
                match (track, property) {
                    (Track::Vector(t), TrackProperty::Translation) => {
                        blend_vec3(&mut slot.translation, weight, t.sample(time))
                    }
                    (Track::Vector(t), TrackProperty::Scale) => {
                        blend_vec3(&mut slot.scale, weight, t.sample(time))
                    }
                    (Track::Quaternion(t), TrackProperty::Rotation) => {
                        blend_quat(&mut slot.rotation, weight, t.sample(time))
                    }
                    _ => {}
                }
            }
        }

        let poses = acc
            .into_iter()
            .map(|(node, a)| {
                let pose = NodePose {
                    translation: a.translation.map(|(_, v)| v),
                    rotation: a.rotation.map(|(_, q)| q.normalize()),
                    scale: a.scale.map(|(_, v)| v),
                };
                (node.to_string(), pose)
            })
            .collect();
        AnimationOutput { poses }
    }

    /// Write the sampled pose into a hierarchy. Returns the number of nodes
    /// touched.
    pub fn apply(&self, root: &mut Node) -> usize {
        let output = self.sample();
        if output.is_empty() {
            return 0;
        }
        let mut touched = 0;
        root.traverse_mut(|node| {
            let Some(pose) = output.pose(node.name()) else {
                return;
            };
            let transform = node.transform_mut();
            if let Some(t) = pose.translation {
                transform.translation = t;
            }
            if let Some(r) = pose.rotation {
                transform.rotation = r;
            }
            if let Some(s) = pose.scale {
                transform.scale = s;
            }
            touched += 1;
        });
        touched
    }
}
