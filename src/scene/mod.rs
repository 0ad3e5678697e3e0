//! # Scene Module
//!
//! Scene graph with hierarchical transformations. Nodes own their children,
//! so a subtree can be moved in and out of the scene as a value.

mod node;
#[allow(clippy::module_inception)]
mod scene;
mod transform;

pub use node::{Node, NodeKind};
pub use scene::{Background, Fog, Scene};
pub use transform::Transform;
