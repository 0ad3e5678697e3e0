//! Buffer geometry for storing vertex and index data.

use super::Vertex;
use crate::core::Id;
use crate::math::Vec3;

/// Triangle geometry held on the CPU. GPU buffers are built from it by the
/// renderer.
#[derive(Debug, Clone, Default)]
pub struct BufferGeometry {
    id: Id,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Option<Vec<u32>>,
    joints: Vec<[u16; 4]>,
    weights: Vec<[f32; 4]>,
}

impl BufferGeometry {
    /// Create a geometry from vertex positions.
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self {
            id: Id::new(),
            positions,
            ..Default::default()
        }
    }

    /// Attach per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = normals;
        self
    }

    /// Attach texture coordinates.
    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = uvs;
        self
    }

    /// Attach a triangle index list.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Attach skinning joints and weights.
    pub fn with_skin_attributes(mut self, joints: Vec<[u16; 4]>, weights: Vec<[f32; 4]>) -> Self {
        self.joints = joints;
        self.weights = weights;
        self
    }

    /// Get the unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Vertex positions.
    #[inline]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Vertex normals (empty if none).
    #[inline]
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Texture coordinates (empty if none).
    #[inline]
    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    /// Index list, if indexed.
    #[inline]
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Skinning joint indices (empty if not skinned).
    #[inline]
    pub fn joints(&self) -> &[[u16; 4]] {
        &self.joints
    }

    /// Skinning weights (empty if not skinned).
    #[inline]
    pub fn weights(&self) -> &[[f32; 4]] {
        &self.weights
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of indices, or vertices for non-indexed geometry.
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(self.positions.len(), Vec::len)
    }

    /// Number of triangles drawn.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.index_count() / 3
    }

    /// Whether the geometry carries complete skinning attributes.
    pub fn is_skinned(&self) -> bool {
        !self.joints.is_empty()
            && self.joints.len() == self.positions.len()
            && self.weights.len() == self.positions.len()
    }

    /// Recompute smooth vertex normals from the triangles.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        let triangles: Vec<[usize; 3]> = match &self.indices {
            Some(indices) => indices
                .chunks_exact(3)
                .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
                .collect(),
            None => (0..self.positions.len() / 3)
                .map(|i| [i * 3, i * 3 + 1, i * 3 + 2])
                .collect(),
        };

        for [a, b, c] in triangles {
            if a >= normals.len() || b >= normals.len() || c >= normals.len() {
                continue;
            }
            let pa = Vec3::from(self.positions[a]);
            let pb = Vec3::from(self.positions[b]);
            let pc = Vec3::from(self.positions[c]);
            let face = (pc - pb).cross(pa - pb);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        self.normals = normals
            .into_iter()
            .map(|n| n.normalize_or_zero().to_array())
            .collect();
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` when empty.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    /// Interleave the attributes into GPU vertices, optionally with
    /// replacement positions and normals (skinned output).
    pub fn interleave(&self, positions: Option<&[[f32; 3]]>, normals: Option<&[[f32; 3]]>) -> Vec<Vertex> {
        let positions = positions.unwrap_or(&self.positions);
        let normals = normals.unwrap_or(&self.normals);
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let n = normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]);
                let uv = self.uvs.get(i).copied().unwrap_or([0.0, 0.0]);
                Vertex::new(*p, n, uv)
            })
            .collect()
    }
}
