//! Material module for surface and line appearance.

mod line;
mod phong;

pub use line::LineBasicMaterial;
pub use phong::{PhongMaterial, PhongMaterialUniform};
