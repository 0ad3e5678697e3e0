//! # Core Module
//!
//! wgpu context management, the renderer seam, and timing utilities.

mod clock;
mod context;
mod id;
mod renderer;

pub use clock::{default_time_source, Clock, ManualTime, TimeSource};
#[cfg(not(target_arch = "wasm32"))]
pub use clock::InstantTime;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use clock::PerformanceTime;
pub use context::{Context, ContextError};
pub use id::Id;
pub use renderer::{HeadlessRenderer, RenderBackend, RenderError, RenderInfo};

use serde::{Deserialize, Serialize};

/// Render configuration options.
///
/// Fixed at renderer construction, like the WebGL renderer options of the
/// component this viewer stands in for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Enable anti-aliasing (4x MSAA when the surface supports it).
    pub antialias: bool,
    /// Enable shadow mapping.
    pub shadow_map_enabled: bool,
    /// Fixed device pixel ratio; `None` uses the viewport's ratio.
    pub pixel_ratio: Option<f64>,
    /// Prefer the high-performance adapter.
    pub high_performance: bool,
    /// Present with vsync.
    pub vsync: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            shadow_map_enabled: true,
            pixel_ratio: None,
            high_performance: true,
            vsync: true,
        }
    }
}
