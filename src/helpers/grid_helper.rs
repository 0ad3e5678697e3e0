//! Grid helper for visualizing a ground plane.

use crate::core::Id;
use crate::geometry::ColorVertex;
use crate::material::LineBasicMaterial;
use crate::math::Color;
use std::sync::Arc;

/// Helper to visualize a grid on the XZ plane.
#[derive(Debug, Clone)]
pub struct GridHelper {
    id: Id,
    size: f32,
    divisions: u32,
    vertices: Arc<Vec<ColorVertex>>,
    /// Line appearance (opacity, blending).
    pub material: LineBasicMaterial,
}

impl GridHelper {
    /// Create a new grid helper.
    ///
    /// # Arguments
    /// * `size` - Total size of the grid (side length)
    /// * `divisions` - Number of divisions per side
    /// * `center_color` - Color for the two center lines
    /// * `line_color` - Color for the other lines
    pub fn new(size: f32, divisions: u32, center_color: impl Into<Color>, line_color: impl Into<Color>) -> Self {
        let divisions = divisions.max(1);
        let center_color = center_color.into().to_rgba(1.0);
        let line_color = line_color.into().to_rgba(1.0);
        let half_size = size / 2.0;
        let step = size / divisions as f32;
        let center = divisions / 2;

        let mut vertices = Vec::with_capacity((divisions as usize + 1) * 4);
        for i in 0..=divisions {
            let pos = -half_size + i as f32 * step;
            let color = if i == center { center_color } else { line_color };

            vertices.push(ColorVertex::new([-half_size, 0.0, pos], color));
            vertices.push(ColorVertex::new([half_size, 0.0, pos], color));
            vertices.push(ColorVertex::new([pos, 0.0, -half_size], color));
            vertices.push(ColorVertex::new([pos, 0.0, half_size], color));
        }

        Self {
            id: Id::new(),
            size,
            divisions,
            vertices: Arc::new(vertices),
            material: LineBasicMaterial::default(),
        }
    }

    /// Builder-style opacity; also turns on blending.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.material.opacity = opacity;
        self.material.transparent = true;
        self
    }

    /// Get the unique ID.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Divisions per side.
    #[inline]
    pub fn divisions(&self) -> u32 {
        self.divisions
    }

    /// Line-list vertices, two per segment.
    #[inline]
    pub fn vertices(&self) -> &[ColorVertex] {
        &self.vertices
    }

    /// Number of line segments.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 2
    }
}

impl Default for GridHelper {
    fn default() -> Self {
        Self::new(10.0, 10, 0x444444, 0x888888)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_segment_count() {
        let grid = GridHelper::new(2000.0, 20, 0x000000, 0x000000);
        assert_eq!(grid.segment_count(), 42);
        assert_eq!(grid.vertices().len(), 84);
    }

    #[test]
    fn test_grid_extent_and_center_color() {
        let grid = GridHelper::new(2000.0, 20, 0xff0000, 0x0000ff);
        for v in grid.vertices() {
            assert!(v.position[0].abs() <= 1000.0 && v.position[2].abs() <= 1000.0);
            assert_eq!(v.position[1], 0.0);
        }
        let center: Vec<_> = grid
            .vertices()
            .iter()
            .filter(|v| v.color == [1.0, 0.0, 0.0, 1.0])
            .collect();
        assert_eq!(center.len(), 4);
        assert!(center.iter().any(|v| v.position[2] == 0.0));
    }

    #[test]
    fn test_opacity_enables_blending() {
        let grid = GridHelper::default().with_opacity(0.2);
        assert!(grid.material.transparent);
        assert_eq!(grid.material.effective_opacity(), 0.2);
    }
}
