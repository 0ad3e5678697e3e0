//! Viewer configuration and viewport sizing.
//!
//! [`ViewerConfig::default`] reproduces the stock viewer: a grey studio with
//! fog, three lights, a ground plane and a grid, looking at a character
//! standing at the origin. Any field can be overridden from JSON; missing
//! fields keep their defaults.

use crate::camera::OrthographicCamera;
use crate::core::RenderConfig;
use crate::light::DirectionalShadow;
use crate::math::Color;
use crate::scene::Fog;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

/// Errors produced while reading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The JSON was malformed or had wrongly typed fields.
    #[error("Invalid viewer config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Perspective camera and orbit target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Initial camera position.
    pub position: [f32; 3],
    /// Point the orbit controls revolve around.
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 1.0,
            far: 2000.0,
            position: [100.0, 200.0, 300.0],
            target: [0.0, 100.0, 0.0],
        }
    }
}

/// Scene background and fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Clear color.
    pub background: Color,
    /// Distance fog.
    pub fog: Fog,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let grey = Color::from_hex(0xa0a0a0);
        Self {
            background: grey,
            fog: Fog::Linear {
                color: grey,
                near: 200.0,
                far: 1000.0,
            },
        }
    }
}

/// Ambient light settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    /// Light color.
    pub color: Color,
    /// Light intensity.
    pub intensity: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0x000099),
            intensity: 1.0,
        }
    }
}

/// Hemisphere light settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HemisphereConfig {
    /// Color from above.
    pub sky_color: Color,
    /// Color from below.
    pub ground_color: Color,
    /// Light intensity.
    pub intensity: f32,
    /// Position; its direction from the origin is "up".
    pub position: [f32; 3],
}

impl Default for HemisphereConfig {
    fn default() -> Self {
        Self {
            sky_color: Color::from_hex(0xffffff),
            ground_color: Color::from_hex(0x444444),
            intensity: 1.0,
            position: [0.0, 200.0, 0.0],
        }
    }
}

/// Directional light settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalConfig {
    /// Light color.
    pub color: Color,
    /// Light intensity.
    pub intensity: f32,
    /// Light position; it shines at the origin.
    pub position: [f32; 3],
    /// Render a shadow map from this light.
    pub cast_shadow: bool,
    /// Shadow camera and map size.
    pub shadow: DirectionalShadow,
}

impl Default for DirectionalConfig {
    fn default() -> Self {
        Self {
            color: Color::from_hex(0xffffff),
            intensity: 1.0,
            position: [0.0, 200.0, 100.0],
            cast_shadow: true,
            shadow: DirectionalShadow {
                camera: OrthographicCamera {
                    left: -120.0,
                    right: 120.0,
                    top: 180.0,
                    bottom: -100.0,
                    near: 0.5,
                    far: 500.0,
                },
                ..DirectionalShadow::default()
            },
        }
    }
}

/// The three studio lights.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    /// Ambient term.
    pub ambient: AmbientConfig,
    /// Sky/ground gradient.
    pub hemisphere: HemisphereConfig,
    /// Shadow-casting key light.
    pub directional: DirectionalConfig,
}

/// Ground plane settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Edge length of the square plane.
    pub size: f32,
    /// Surface color.
    pub color: Color,
    /// Write the plane to the depth buffer.
    pub depth_write: bool,
    /// Darken where the key light is blocked.
    pub receive_shadow: bool,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 2000.0,
            color: Color::from_hex(0x999999),
            depth_write: false,
            receive_shadow: true,
        }
    }
}

/// Grid helper settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Edge length.
    pub size: f32,
    /// Cells per edge.
    pub divisions: u32,
    /// Color of the two center lines.
    pub center_color: Color,
    /// Color of the other lines.
    pub line_color: Color,
    /// Line opacity.
    pub opacity: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 2000.0,
            divisions: 20,
            center_color: Color::from_hex(0x000000),
            line_color: Color::from_hex(0x000000),
            opacity: 0.2,
        }
    }
}

/// Canvas placement inside the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Subtracted from the viewport width.
    pub width_margin: u32,
    /// Subtracted from the viewport height.
    pub height_margin: u32,
    /// DOM id of the element the canvas is appended to.
    pub container_id: String,
    /// Add a button under the canvas that loads the default model.
    pub load_button: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width_margin: 16,
            height_margin: 50,
            container_id: "container".to_string(),
            load_button: true,
        }
    }
}

impl LayoutConfig {
    /// Canvas size for a viewport. Saturates at zero.
    pub fn canvas_size(&self, viewport: ViewportSize) -> (u32, u32) {
        (
            viewport.width.saturating_sub(self.width_margin),
            viewport.height.saturating_sub(self.height_margin),
        )
    }
}

/// Complete viewer configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Camera and orbit target.
    pub camera: CameraConfig,
    /// Background and fog.
    pub scene: SceneConfig,
    /// Studio lights.
    pub lights: LightsConfig,
    /// Ground plane.
    pub ground: GroundConfig,
    /// Grid helper.
    pub grid: GridConfig,
    /// Renderer options.
    pub renderer: RenderConfig,
    /// Canvas placement.
    pub layout: LayoutConfig,
    /// Default model.
    pub model: ModelConfig,
}

/// The model offered by the load trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// URL or path of the default model.
    pub url: String,
    /// Label of the load button.
    pub label: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: "models/Samba Dancing.glb".to_string(),
            label: "Load Samba Dancer".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parse a configuration from JSON, filling gaps with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Window size in CSS pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    /// Width in CSS pixels.
    pub width: u32,
    /// Height in CSS pixels.
    pub height: u32,
    /// Physical pixels per CSS pixel.
    pub pixel_ratio: f64,
}

impl ViewportSize {
    /// A viewport at pixel ratio 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    /// Builder-style pixel ratio.
    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }
}

/// Supplies the current window size. The browser binding reads
/// `innerWidth`/`innerHeight`; tests use [`FixedViewport`].
pub trait ViewportProvider {
    /// Current viewport size.
    fn viewport(&self) -> ViewportSize;
}

/// A viewport whose size is set by hand, shared between clones.
#[derive(Debug, Clone)]
pub struct FixedViewport {
    size: Rc<Cell<ViewportSize>>,
}

impl FixedViewport {
    /// Create with an initial size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Rc::new(Cell::new(ViewportSize::new(width, height))),
        }
    }

    /// Change the size seen by every clone.
    pub fn set(&self, size: ViewportSize) {
        self.size.set(size);
    }

    /// Change width and height, keeping the pixel ratio.
    pub fn resize(&self, width: u32, height: u32) {
        let current = self.size.get();
        self.size.set(ViewportSize { width, height, ..current });
    }
}

impl ViewportProvider for FixedViewport {
    fn viewport(&self) -> ViewportSize {
        self.size.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_viewer() {
        let config = ViewerConfig::default();
        assert_eq!(config.camera.fov, 45.0);
        assert_eq!(config.camera.position, [100.0, 200.0, 300.0]);
        assert_eq!(config.scene.background.to_hex(), 0xa0a0a0);
        assert_eq!(config.lights.ambient.color.to_hex(), 0x000099);
        assert_eq!(config.lights.directional.shadow.camera.top, 180.0);
        assert_eq!(config.lights.directional.shadow.camera.left, -120.0);
        assert_eq!(config.grid.divisions, 20);
        assert!(!config.ground.depth_write);
        assert!(config.renderer.antialias);
        assert!(config.renderer.shadow_map_enabled);
    }

    #[test]
    fn test_json_overrides_field_by_field() {
        let config = ViewerConfig::from_json(
            r#"{ "camera": { "fov": 60 }, "layout": { "height_margin": 0 }, "model": { "url": "a.glb" } }"#,
        )
        .unwrap();
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.camera.far, 2000.0);
        assert_eq!(config.layout.height_margin, 0);
        assert_eq!(config.layout.width_margin, 16);
        assert_eq!(config.model.url, "a.glb");
        assert_eq!(config.model.label, "Load Samba Dancer");
    }

    #[test]
    fn test_json_fog_variants() {
        let config = ViewerConfig::from_json(r#"{ "scene": { "fog": { "type": "none" } } }"#).unwrap();
        assert_eq!(config.scene.fog, Fog::None);
        assert_eq!(config.scene.background.to_hex(), 0xa0a0a0);
    }

    #[test]
    fn test_json_round_trip_and_errors() {
        let config = ViewerConfig::default();
        let back = ViewerConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
        assert!(matches!(
            ViewerConfig::from_json(r#"{ "camera": { "fov": "wide" } }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_canvas_size_saturates() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.canvas_size(ViewportSize::new(1024, 768)), (1008, 718));
        assert_eq!(layout.canvas_size(ViewportSize::new(10, 40)), (0, 0));
    }

    #[test]
    fn test_fixed_viewport_shared_between_clones() {
        let viewport = FixedViewport::new(800, 600);
        let clone = viewport.clone();
        viewport.set(ViewportSize::new(800, 600).with_pixel_ratio(2.0));
        clone.resize(1024, 768);
        assert_eq!(viewport.viewport(), ViewportSize::new(1024, 768).with_pixel_ratio(2.0));
    }
}
