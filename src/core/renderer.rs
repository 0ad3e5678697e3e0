//! Renderer abstraction and the headless implementation.

use crate::camera::PerspectiveCamera;
use crate::scene::{NodeKind, Scene};
use thiserror::Error;

/// Errors a frame can fail with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The surface must be reconfigured before the next frame.
    #[error("Surface lost or outdated")]
    SurfaceLost,

    /// Acquiring the next surface texture timed out.
    #[error("Timed out acquiring surface texture")]
    Timeout,

    /// The GPU ran out of memory.
    #[error("GPU out of memory")]
    OutOfMemory,

    /// Any other surface failure.
    #[error("Surface error: {0}")]
    Other(String),
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        #[allow(unreachable_patterns)]
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::SurfaceLost,
            wgpu::SurfaceError::Timeout => Self::Timeout,
            wgpu::SurfaceError::OutOfMemory => Self::OutOfMemory,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Render statistics for the current frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderInfo {
    /// Number of draw calls.
    pub draw_calls: u32,
    /// Number of triangles rendered.
    pub triangles: u32,
    /// Number of line segments rendered.
    pub lines: u32,
    /// Whether a shadow pass ran this frame.
    pub shadow_pass: bool,
    /// Frame number.
    pub frame: u64,
}

impl RenderInfo {
    /// Reset the per-frame statistics.
    pub fn reset(&mut self) {
        self.draw_calls = 0;
        self.triangles = 0;
        self.lines = 0;
        self.shadow_pass = false;
    }

    /// Begin a new frame.
    pub fn begin_frame(&mut self) {
        self.reset();
        self.frame += 1;
    }

    /// Accumulate the draw statistics of everything visible in the scene.
    pub fn count_scene(&mut self, scene: &Scene) {
        scene.traverse_visible(|node| match node.kind() {
            NodeKind::Mesh(mesh) => {
                self.draw_calls += 1;
                self.triangles += mesh.geometry().triangle_count() as u32;
            }
            NodeKind::Grid(grid) => {
                self.draw_calls += 1;
                self.lines += grid.segment_count() as u32;
            }
            _ => {}
        });
    }
}

/// The rendering seam between the scene manager and a concrete backend.
///
/// Sizes are in CSS (logical) pixels; the backend multiplies by the pixel
/// ratio for its drawing buffer.
pub trait RenderBackend {
    /// Set the device pixel ratio.
    fn set_pixel_ratio(&mut self, ratio: f64);

    /// Current device pixel ratio.
    fn pixel_ratio(&self) -> f64;

    /// Resize the output surface (logical pixels).
    fn set_size(&mut self, width: u32, height: u32);

    /// Current output size (logical pixels).
    fn size(&self) -> (u32, u32);

    /// Size of the drawing buffer in physical pixels.
    fn drawing_buffer_size(&self) -> (u32, u32) {
        let (w, h) = self.size();
        let ratio = self.pixel_ratio();
        ((w as f64 * ratio) as u32, (h as f64 * ratio) as u32)
    }

    /// Enable or disable shadow mapping.
    fn set_shadow_map_enabled(&mut self, enabled: bool);

    /// Whether shadow mapping is enabled.
    fn shadow_map_enabled(&self) -> bool;

    /// Draw the scene as seen from the camera.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError>;

    /// Statistics of the last frame.
    fn info(&self) -> &RenderInfo;
}

/// A renderer that keeps the bookkeeping but touches no GPU.
///
/// Used by tests and by hosts that only need the scene logic.
#[derive(Debug, Clone)]
pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    pixel_ratio: f64,
    shadow_map_enabled: bool,
    info: RenderInfo,
    last_aspect: Option<f32>,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    /// Create a zero-sized headless renderer.
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            pixel_ratio: 1.0,
            shadow_map_enabled: false,
            info: RenderInfo::default(),
            last_aspect: None,
        }
    }

    /// Number of frames rendered so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.info.frame
    }

    /// Camera aspect ratio seen by the last frame.
    #[inline]
    pub fn last_aspect(&self) -> Option<f32> {
        self.last_aspect
    }
}

impl RenderBackend for HeadlessRenderer {
    fn set_pixel_ratio(&mut self, ratio: f64) {
        if ratio > 0.0 {
            self.pixel_ratio = ratio;
        }
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_shadow_map_enabled(&mut self, enabled: bool) {
        self.shadow_map_enabled = enabled;
    }

    fn shadow_map_enabled(&self) -> bool {
        self.shadow_map_enabled
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        self.info.begin_frame();
        self.info.count_scene(scene);
        self.info.shadow_pass = self.shadow_map_enabled && scene.has_shadow_caster();
        self.last_aspect = Some(camera.aspect);
        Ok(())
    }

    fn info(&self) -> &RenderInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawing_buffer_scales_with_pixel_ratio() {
        let mut renderer = HeadlessRenderer::new();
        renderer.set_size(800, 600);
        renderer.set_pixel_ratio(2.0);
        assert_eq!(renderer.size(), (800, 600));
        assert_eq!(renderer.drawing_buffer_size(), (1600, 1200));
    }

    #[test]
    fn test_invalid_pixel_ratio_ignored() {
        let mut renderer = HeadlessRenderer::new();
        renderer.set_pixel_ratio(0.0);
        assert_eq!(renderer.pixel_ratio(), 1.0);
    }

    #[test]
    fn test_render_counts_frames() {
        let mut renderer = HeadlessRenderer::new();
        let scene = Scene::new();
        let camera = PerspectiveCamera::new(45.0, 2.0, 1.0, 2000.0);
        renderer.render(&scene, &camera).unwrap();
        renderer.render(&scene, &camera).unwrap();
        assert_eq!(renderer.frames(), 2);
        assert_eq!(renderer.info().draw_calls, 0);
        assert_eq!(renderer.last_aspect(), Some(2.0));
    }

    #[test]
    fn test_surface_error_mapping() {
        assert_eq!(RenderError::from(wgpu::SurfaceError::Lost), RenderError::SurfaceLost);
        assert_eq!(RenderError::from(wgpu::SurfaceError::Outdated), RenderError::SurfaceLost);
        assert_eq!(RenderError::from(wgpu::SurfaceError::Timeout), RenderError::Timeout);
    }
}
