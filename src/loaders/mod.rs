//! Asset loaders for animated models.

mod gltf_loader;
mod loader;

pub use gltf_loader::*;
pub use loader::*;

#[cfg(test)]
pub(crate) use gltf_loader::tests::{animated_triangle, glb};
