//! Mesh object combining geometry and material.

use crate::animation::Skin;
use crate::geometry::BufferGeometry;
use crate::material::PhongMaterial;
use std::sync::Arc;

/// A mesh is a renderable object with geometry and material. Its placement
/// comes from the scene node carrying it.
#[derive(Debug, Clone)]
pub struct Mesh {
    geometry: Arc<BufferGeometry>,
    /// Surface material.
    pub material: PhongMaterial,
    skin: Option<Skin>,
}

impl Mesh {
    /// Create a new mesh with geometry and material.
    pub fn new(geometry: impl Into<Arc<BufferGeometry>>, material: PhongMaterial) -> Self {
        Self {
            geometry: geometry.into(),
            material,
            skin: None,
        }
    }

    /// Bind the mesh to a skeleton.
    pub fn with_skin(mut self, skin: Skin) -> Self {
        self.skin = Some(skin);
        self
    }

    /// Replace the skeleton binding.
    pub fn set_skin(&mut self, skin: Option<Skin>) {
        self.skin = skin;
    }

    /// Get the geometry.
    #[inline]
    pub fn geometry(&self) -> &BufferGeometry {
        &self.geometry
    }

    /// Shared handle to the geometry.
    #[inline]
    pub fn geometry_arc(&self) -> &Arc<BufferGeometry> {
        &self.geometry
    }

    /// Skeleton binding, if skinned.
    #[inline]
    pub fn skin(&self) -> Option<&Skin> {
        self.skin.as_ref()
    }

    /// Whether the mesh deforms with a skeleton.
    #[inline]
    pub fn is_skinned(&self) -> bool {
        self.skin.is_some() && self.geometry.is_skinned()
    }
}
