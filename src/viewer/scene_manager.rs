//! The scene manager: owns everything the viewer draws and advances.

use super::frame_loop::{FrameLoop, FrameLoopHandle, LoopState};
use super::setup::{build_camera, build_controls, build_scene};
use crate::animation::AnimationMixer;
use crate::camera::PerspectiveCamera;
use crate::config::{ViewerConfig, ViewportProvider};
use crate::controls::OrbitControls;
use crate::core::{Clock, Id, RenderBackend, RenderError};
use crate::loaders::{LoadError, LoadState, LoadedModel, ModelLoader};
use crate::scene::{Node, Scene};

/// Scene, camera, controls, clock, mixer and renderer of one viewer.
///
/// Holds no DOM state. The host forwards input, viewport changes and
/// animation frames to it.
pub struct SceneManager<R: RenderBackend> {
    config: ViewerConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    clock: Clock,
    renderer: R,
    viewport: Box<dyn ViewportProvider>,
    mixer: Option<AnimationMixer>,
    model: Option<Id>,
    load_state: LoadState,
    frame_loop: FrameLoop,
}

impl<R: RenderBackend> SceneManager<R> {
    /// Build the scene, size the renderer to the canvas and draw the first
    /// frame.
    pub fn mount(config: ViewerConfig, renderer: R, viewport: Box<dyn ViewportProvider>, clock: Clock) -> Self {
        let scene = build_scene(&config);
        let view = viewport.viewport();
        let (width, height) = config.layout.canvas_size(view);
        let aspect = if height > 0 { width as f32 / height as f32 } else { 1.0 };
        let mut camera = build_camera(&config, aspect);

        let mut renderer = renderer;
        renderer.set_pixel_ratio(config.renderer.pixel_ratio.unwrap_or(view.pixel_ratio));
        renderer.set_size(width, height);
        renderer.set_shadow_map_enabled(config.renderer.shadow_map_enabled);

        let mut controls = build_controls(&config, &mut camera);
        controls.set_element_size(width, height);

        log::info!("Viewer mounted at {}x{} (pixel ratio {})", width, height, renderer.pixel_ratio());

        let mut manager = Self {
            config,
            scene,
            camera,
            controls,
            clock,
            renderer,
            viewport,
            mixer: None,
            model: None,
            load_state: LoadState::Idle,
            frame_loop: FrameLoop::new(),
        };
        manager.render();
        manager
    }

    /// Mark a load as in flight.
    pub fn begin_load(&mut self) {
        self.load_state = LoadState::Loading;
    }

    /// Load through `loader` and hand the result to
    /// [`SceneManager::on_model_loaded`].
    pub fn load_model(&mut self, loader: &impl ModelLoader, uri: &str) -> bool {
        self.begin_load();
        let result = loader.load(uri);
        self.on_model_loaded(result)
    }

    /// Completion of a model load. On success the model joins the scene and
    /// the frame loop starts; on failure nothing changes but the load
    /// state. A load finishing after [`SceneManager::dispose`] is dropped.
    /// Returns whether the model was attached.
    pub fn on_model_loaded(&mut self, result: Result<LoadedModel, LoadError>) -> bool {
        if self.frame_loop.state() == LoopState::Cancelled {
            log::debug!("Viewer disposed, dropping loaded model");
            return false;
        }
        match result {
            Ok(model) => {
                self.attach_model(model);
                true
            }
            Err(err) => {
                log::error!("Failed to load model: {}", err);
                self.load_state = LoadState::Failed;
                false
            }
        }
    }

    /// Add a loaded model: shadows on every mesh, a mixer bound to it that
    /// plays its first clip if it has one, then start the frame loop.
    /// Returns the model root's id.
    pub fn attach_model(&mut self, mut model: LoadedModel) -> Id {
        model.set_shadows(true, true);
        log::info!(
            "Loading 3D model: {} ({} meshes, {} clips)",
            model.root.name(),
            model.mesh_count(),
            model.animations.len()
        );

        let LoadedModel { root, animations } = model;
        let id = self.scene.add(root);

        let mut mixer = AnimationMixer::new(id);
        match animations.first() {
            Some(clip) => {
                mixer.clip_action(clip.clone()).play();
            }
            None => log::debug!("Model has no animation clips"),
        }
        self.mixer = Some(mixer);

        self.model = Some(id);
        self.load_state = LoadState::Loaded;
        self.frame_loop.start();
        id
    }

    /// Run one frame if the loop is running. Returns whether a frame ran.
    pub fn tick(&mut self) -> bool {
        if !self.frame_loop.should_tick() {
            return false;
        }
        self.frame();
        self.frame_loop.record_tick();
        true
    }

    /// Clock delta, mixer, controls, render. Runs regardless of loop state.
    pub fn frame(&mut self) {
        let delta = self.clock.get_delta() as f32;

        if let Some(mixer) = &mut self.mixer {
            mixer.update(delta);
            if let Some(root) = self.scene.find_by_id_mut(mixer.root()) {
                mixer.apply(root);
            }
        }

        self.controls.update(&mut self.camera);
        self.render();
    }

    /// Apply pending control input and draw, leaving the clock and mixer
    /// alone. Used to refresh the view while no loop is running.
    pub fn redraw(&mut self) {
        self.controls.update(&mut self.camera);
        self.render();
    }

    fn render(&mut self) {
        match self.renderer.render(&self.scene, &self.camera) {
            Ok(()) => {}
            Err(RenderError::SurfaceLost) => log::debug!("Surface lost, frame skipped"),
            Err(err) => log::warn!("Render failed: {}", err),
        }
    }

    /// Follow the viewport: camera aspect, renderer size and controls.
    pub fn resize(&mut self) {
        let (width, height) = self.canvas_size();
        if width > 0 && height > 0 {
            self.camera.set_aspect(width as f32 / height as f32);
        }
        self.renderer.set_size(width, height);
        self.controls.set_element_size(width, height);
        log::debug!("Viewer resized to {}x{}", width, height);
    }

    /// Canvas size for the current viewport.
    pub fn canvas_size(&self) -> (u32, u32) {
        self.config.layout.canvas_size(self.viewport.viewport())
    }

    /// Stop the loop and every animation. Returns the animation frame
    /// request the host still has to cancel.
    pub fn dispose(&mut self) -> Option<i32> {
        if self.frame_loop.state() == LoopState::Cancelled {
            return None;
        }
        let request = self.frame_loop.cancel();
        if let Some(mixer) = &mut self.mixer {
            mixer.stop_all_action();
        }
        log::info!("Viewer disposed after {} frames", self.frame_loop.ticks());
        request
    }

    /// Shared cancellation handle of the frame loop.
    pub fn frame_loop_handle(&self) -> FrameLoopHandle {
        self.frame_loop.handle()
    }

    /// The frame loop.
    pub fn frame_loop_mut(&mut self) -> &mut FrameLoop {
        &mut self.frame_loop
    }

    /// Frames produced by the loop so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_loop.ticks()
    }

    /// Whether the frame loop is producing frames.
    pub fn is_running(&self) -> bool {
        self.frame_loop.should_tick()
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scene, mutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The camera.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// The orbit controls, for forwarding input.
    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// The mixer, present once a model has loaded.
    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    /// Root node of the loaded model.
    pub fn model_root(&self) -> Option<&Node> {
        self.model.and_then(|id| self.scene.find_by_id(id))
    }

    /// Progress of the last model load.
    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// The configuration the viewer was mounted with.
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }
}

impl<R: RenderBackend> Drop for SceneManager<R> {
    fn drop(&mut self) {
        self.frame_loop.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixedViewport;
    use crate::core::{HeadlessRenderer, ManualTime};
    use crate::loaders::{animated_triangle, glb, GltfLoader};
    use serde_json::json;

    struct BytesLoader(Vec<u8>);

    impl ModelLoader for BytesLoader {
        fn load(&self, _uri: &str) -> Result<LoadedModel, LoadError> {
            GltfLoader::new().load_from_bytes(&self.0)
        }
    }

    fn mount(viewport: &FixedViewport, time: &ManualTime) -> SceneManager<HeadlessRenderer> {
        SceneManager::mount(
            ViewerConfig::default(),
            HeadlessRenderer::new(),
            Box::new(viewport.clone()),
            Clock::with_source(Box::new(time.clone())),
        )
    }

    fn dancer() -> BytesLoader {
        BytesLoader(animated_triangle())
    }

    #[test]
    fn test_mount_sizes_renderer_to_canvas() {
        let viewport = FixedViewport::new(1024, 768);
        let manager = mount(&viewport, &ManualTime::new());
        assert_eq!(manager.renderer().size(), (1008, 718));
        assert!((manager.camera().aspect - 1008.0 / 718.0).abs() < 1e-6);
        assert!(manager.renderer().shadow_map_enabled());
        assert_eq!(manager.renderer().frames(), 1);
        assert_eq!(manager.scene().children_count(), 5);
    }

    #[test]
    fn test_mount_uses_viewport_pixel_ratio() {
        let viewport = FixedViewport::new(1024, 768);
        viewport.set(viewport.viewport().with_pixel_ratio(2.0));
        let manager = mount(&viewport, &ManualTime::new());
        assert_eq!(manager.renderer().pixel_ratio(), 2.0);
        assert_eq!(manager.renderer().drawing_buffer_size(), (2016, 1436));
    }

    #[test]
    fn test_mixer_absent_until_load() {
        let mut manager = mount(&FixedViewport::new(800, 600), &ManualTime::new());
        assert!(manager.mixer().is_none());
        assert_eq!(manager.load_state(), LoadState::Idle);
        assert!(!manager.is_running());

        assert!(manager.load_model(&dancer(), "dancer.glb"));
        let mixer = manager.mixer().unwrap();
        assert_eq!(mixer.actions().len(), 1);
        assert_eq!(mixer.actions()[0].clip().name, "Dance");
        assert!(mixer.actions()[0].is_playing());
        assert_eq!(Some(mixer.root()), manager.model_root().map(|n| n.id()));
        assert_eq!(manager.load_state(), LoadState::Loaded);
        assert_eq!(manager.scene().children_count(), 6);
        assert!(manager.is_running());
    }

    #[test]
    fn test_failed_load_leaves_scene_untouched() {
        let mut manager = mount(&FixedViewport::new(800, 600), &ManualTime::new());
        let loaded = manager.load_model(&BytesLoader(b"not a model".to_vec()), "broken.glb");
        assert!(!loaded);
        assert!(manager.mixer().is_none());
        assert!(manager.model_root().is_none());
        assert_eq!(manager.scene().children_count(), 5);
        assert_eq!(manager.load_state(), LoadState::Failed);
        assert!(!manager.is_running());
        assert!(!manager.tick());
    }

    #[test]
    fn test_loaded_meshes_cast_and_receive_shadows() {
        let mut manager = mount(&FixedViewport::new(800, 600), &ManualTime::new());
        manager.load_model(&dancer(), "dancer.glb");
        let mut meshes = 0;
        manager.model_root().unwrap().traverse(|node| {
            if node.is_mesh() {
                assert!(node.cast_shadow);
                assert!(node.receive_shadow);
                meshes += 1;
            }
        });
        assert_eq!(meshes, 1);
    }

    #[test]
    fn test_resize_follows_viewport() {
        let viewport = FixedViewport::new(800, 600);
        let mut manager = mount(&viewport, &ManualTime::new());
        viewport.resize(1216, 850);
        manager.resize();
        assert_eq!(manager.renderer().size(), (1200, 800));
        assert!((manager.camera().aspect - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_resize_below_margins_keeps_aspect() {
        let viewport = FixedViewport::new(800, 600);
        let mut manager = mount(&viewport, &ManualTime::new());
        let aspect = manager.camera().aspect;
        viewport.resize(10, 40);
        manager.resize();
        assert_eq!(manager.renderer().size(), (0, 0));
        assert_eq!(manager.camera().aspect, aspect);
    }

    #[test]
    fn test_frame_advances_mixer_by_delta() {
        let time = ManualTime::new();
        let mut manager = mount(&FixedViewport::new(800, 600), &time);
        manager.load_model(&dancer(), "dancer.glb");

        // The first tick starts the clock.
        assert!(manager.tick());
        assert_eq!(manager.mixer().unwrap().time(), 0.0);

        time.advance(0.25);
        manager.tick();
        assert!((manager.mixer().unwrap().time() - 0.25).abs() < 1e-6);

        time.advance(0.25);
        manager.tick();
        assert!((manager.mixer().unwrap().time() - 0.5).abs() < 1e-6);

        let body = manager.scene().find_by_name("Body").unwrap();
        assert!((body.position().x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_tick_renders_each_frame() {
        let time = ManualTime::new();
        let mut manager = mount(&FixedViewport::new(800, 600), &time);
        assert!(!manager.tick());
        manager.load_model(&dancer(), "dancer.glb");
        manager.tick();
        manager.tick();
        assert_eq!(manager.renderer().frames(), 3);
        assert_eq!(manager.frame_count(), 2);
    }

    #[test]
    fn test_cancelled_loop_stops_rendering() {
        let mut manager = mount(&FixedViewport::new(800, 600), &ManualTime::new());
        manager.load_model(&dancer(), "dancer.glb");
        manager.frame_loop_handle().cancel();
        assert!(!manager.tick());
        assert_eq!(manager.renderer().frames(), 1);
    }

    #[test]
    fn test_dispose_stops_actions_and_returns_request() {
        let mut manager = mount(&FixedViewport::new(800, 600), &ManualTime::new());
        manager.load_model(&dancer(), "dancer.glb");
        manager.frame_loop_mut().set_request(42);
        assert_eq!(manager.dispose(), Some(42));
        assert!(!manager.mixer().unwrap().is_playing());
        assert!(!manager.tick());
        assert_eq!(manager.dispose(), None);
    }

    #[test]
    fn test_second_model_rebinds_mixer() {
        let mut manager = mount(&FixedViewport::new(800, 600), &ManualTime::new());
        manager.load_model(&dancer(), "a.glb");
        let first = manager.mixer().unwrap().root();
        manager.load_model(&dancer(), "b.glb");
        let second = manager.mixer().unwrap().root();
        assert_ne!(first, second);
        assert_eq!(Some(second), manager.model_root().map(|n| n.id()));
        assert_eq!(manager.scene().children_count(), 7);
    }

    #[test]
    fn test_model_without_clips_gets_idle_mixer() {
        let mut bin = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        let doc = json!({
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": "Statue", "mesh": 0 }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
            "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }],
            "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
            "buffers": [{ "byteLength": 36 }]
        });
        let statue = BytesLoader(glb(&doc, &bin));

        let mut manager = mount(&FixedViewport::new(800, 600), &ManualTime::new());
        assert!(manager.load_model(&statue, "statue.glb"));
        let mixer = manager.mixer().unwrap();
        assert!(mixer.actions().is_empty());
        assert_eq!(Some(mixer.root()), manager.model_root().map(|n| n.id()));
        assert!(manager.is_running());
        assert!(manager.tick());

        // After an animated model, the mixer moves to the still one.
        let mut manager = mount(&FixedViewport::new(800, 600), &ManualTime::new());
        manager.load_model(&dancer(), "dancer.glb");
        assert!(manager.load_model(&statue, "statue.glb"));
        assert_eq!(manager.load_state(), LoadState::Loaded);
        let mixer = manager.mixer().unwrap();
        assert!(mixer.actions().is_empty());
        assert_eq!(Some(mixer.root()), manager.model_root().map(|n| n.id()));
    }

    #[test]
    fn test_idle_redraw_leaves_clock_unstarted() {
        let time = ManualTime::new();
        let mut manager = mount(&FixedViewport::new(800, 600), &time);
        manager.controls_mut().wheel(100.0);
        manager.redraw();
        assert_eq!(manager.renderer().frames(), 2);

        time.advance(0.4);
        manager.load_model(&dancer(), "dancer.glb");
        manager.tick();
        assert_eq!(manager.mixer().unwrap().time(), 0.0);
    }

    #[test]
    fn test_load_after_dispose_is_dropped() {
        let mut manager = mount(&FixedViewport::new(800, 600), &ManualTime::new());
        manager.dispose();
        assert!(!manager.load_model(&dancer(), "dancer.glb"));
        assert!(manager.mixer().is_none());
        assert!(manager.model_root().is_none());
        assert_eq!(manager.scene().children_count(), 5);
        assert!(!manager.is_running());
    }
}
