//! # Ren Viewer - Animated glTF Viewer on wgpu
//!
//! A small viewer that stages an animated character in a lit studio: grey
//! backdrop with linear fog, ambient, hemisphere and shadow-casting
//! directional lights, a ground plane and a grid. A loaded model plays its
//! first animation clip while orbit controls move the camera.
//!
//! ## Layout
//!
//! - **Viewer**: [`viewer::SceneManager`] owns scene, camera, controls,
//!   clock, mixer and renderer; no DOM, no globals
//! - **Scene**: node hierarchy with meshes, lights and helpers
//! - **Animation**: keyframe clips, actions, mixer and CPU skinning
//! - **Loaders**: glTF 2.0 via the `gltf` crate
//! - **GPU**: wgpu forward renderer with a directional shadow map
//! - **Web** (feature `web`): the `Viewer3D` binding for the browser
//!
//! ## Example
//!
//! ```ignore
//! use ren_viewer::prelude::*;
//!
//! let viewport = FixedViewport::new(1024, 768);
//! let mut viewer = SceneManager::mount(
//!     ViewerConfig::default(),
//!     HeadlessRenderer::new(),
//!     Box::new(viewport),
//!     Clock::new(),
//! );
//! viewer.load_model(&FileLoader::new("assets"), "models/Samba Dancing.glb");
//! while viewer.tick() {
//!     // one frame per display refresh
//! }
//! ```

#![warn(missing_docs)]

#[cfg(all(feature = "web", target_arch = "wasm32"))]
use wasm_bindgen::prelude::*;

pub mod math;
pub mod core;
pub mod scene;
pub mod geometry;
pub mod material;
pub mod camera;
pub mod light;
pub mod controls;
pub mod objects;
pub mod helpers;
pub mod animation;
pub mod loaders;
pub mod config;
pub mod gpu;
pub mod viewer;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::math::*;
    pub use crate::core::*;
    pub use crate::scene::*;
    pub use crate::geometry::*;
    pub use crate::material::*;
    pub use crate::camera::*;
    pub use crate::light::*;
    pub use crate::controls::*;
    pub use crate::objects::*;
    pub use crate::helpers::*;
    pub use crate::animation::*;
    pub use crate::loaders::*;
    pub use crate::config::*;
    pub use crate::viewer::*;
}

/// Initialize the viewer for WASM environments.
/// Sets up panic hooks and routes `log` records to the browser console.
#[cfg(all(feature = "web", target_arch = "wasm32"))]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = "Ren Viewer";
