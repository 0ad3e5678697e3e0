//! Geometry module for vertex data and primitives.

mod buffer_geometry;
mod plane_geometry;
mod vertex;

pub use buffer_geometry::BufferGeometry;
pub use plane_geometry::PlaneGeometry;
pub use vertex::{ColorVertex, Vertex};
