//! Renderable objects module.
//!
//! Contains the mesh type carried by scene nodes.

mod mesh;

pub use mesh::*;
