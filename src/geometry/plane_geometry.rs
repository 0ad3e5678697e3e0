//! Plane geometry.

use super::BufferGeometry;

/// A plane geometry (flat rectangular surface).
///
/// Lies in the XY plane facing +Z; rotate by -π/2 around X to use it as a
/// floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGeometry {
    /// Width (X axis).
    pub width: f32,
    /// Height (Y axis).
    pub height: f32,
    /// Width segments.
    pub width_segments: u32,
    /// Height segments.
    pub height_segments: u32,
}

impl Default for PlaneGeometry {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl PlaneGeometry {
    /// Create a new plane geometry.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            width_segments: 1,
            height_segments: 1,
        }
    }

    /// Create with segments.
    pub fn with_segments(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            width,
            height,
            width_segments: width_segments.max(1),
            height_segments: height_segments.max(1),
        }
    }

    /// Build the vertex and index data.
    pub fn build(&self) -> BufferGeometry {
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        let mut indices = Vec::new();

        let half_width = self.width / 2.0;
        let half_height = self.height / 2.0;
        let segment_width = self.width / self.width_segments as f32;
        let segment_height = self.height / self.height_segments as f32;

        for iy in 0..=self.height_segments {
            let y = iy as f32 * segment_height - half_height;
            for ix in 0..=self.width_segments {
                let x = ix as f32 * segment_width - half_width;
                positions.push([x, -y, 0.0]);
                normals.push([0.0, 0.0, 1.0]);
                uvs.push([
                    ix as f32 / self.width_segments as f32,
                    1.0 - iy as f32 / self.height_segments as f32,
                ]);
            }
        }

        let row = self.width_segments + 1;
        for iy in 0..self.height_segments {
            for ix in 0..self.width_segments {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        BufferGeometry::new(positions)
            .with_normals(normals)
            .with_uvs(uvs)
            .with_indices(indices)
    }
}
