//! # Viewer
//!
//! The viewer proper: the stock studio scene, the frame loop and the
//! [`SceneManager`] tying them to a renderer. Nothing here touches the DOM;
//! the browser binding lives in `web`.

mod frame_loop;
mod scene_manager;
mod setup;

pub use frame_loop::{FrameLoop, FrameLoopHandle, LoopState};
pub use scene_manager::SceneManager;
pub use setup::{build_camera, build_controls, build_scene, GRID_NAME, GROUND_NAME};
