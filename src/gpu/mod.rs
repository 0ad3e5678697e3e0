//! # GPU Module
//!
//! The wgpu implementation of [`RenderBackend`](crate::core::RenderBackend):
//! Blinn-Phong meshes with fog, alpha-blended grid lines and a single
//! directional shadow map filtered with 3×3 PCF.

mod pipelines;
mod renderer;
mod resources;
mod shadow;

pub use pipelines::{PipelineKey, Pipelines};
pub use renderer::GpuRenderer;
pub use resources::{CameraUniform, GpuLines, GpuMesh, LineUniform, ModelUniform};
pub use shadow::{ShadowMap, ShadowPass, SHADOW_FORMAT};
