//! Camera controls driven by pointer and wheel input.

mod orbit;

pub use orbit::{OrbitControls, PointerButton};
