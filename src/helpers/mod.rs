//! Visual helpers for orientation.

mod grid_helper;

pub use grid_helper::GridHelper;
