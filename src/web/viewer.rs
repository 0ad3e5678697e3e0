//! The `Viewer3D` view binding: DOM attachment, listeners and the
//! animation frame loop around a [`SceneManager`].

use super::{js_error, Listener, WindowViewport};
use crate::config::{ViewerConfig, ViewportProvider};
use crate::controls::PointerButton;
use crate::core::{Clock, Context, RenderBackend};
use crate::gpu::GpuRenderer;
use crate::loaders::{GltfLoader, LoadError, LoadedModel};
use crate::viewer::SceneManager;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Element, Event, HtmlCanvasElement, PointerEvent, Response, WheelEvent};

type FrameCallback = Closure<dyn FnMut(f64)>;

/// State shared by the binding, its listeners and the frame callback.
/// Callbacks hold a `Weak` so dropping the viewer frees everything.
struct Inner {
    manager: RefCell<SceneManager<GpuRenderer>>,
    canvas: HtmlCanvasElement,
    button: RefCell<Option<Element>>,
    frame: RefCell<Option<FrameCallback>>,
    listeners: RefCell<Vec<Listener>>,
}

impl Inner {
    /// Schedule the next animation frame unless one is pending or the loop
    /// is not running.
    fn schedule(&self) {
        let mut manager = self.manager.borrow_mut();
        if !manager.is_running() {
            return;
        }
        let frame_loop = manager.frame_loop_mut();
        if frame_loop.pending_request().is_some() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let frame = self.frame.borrow();
        let Some(callback) = frame.as_ref() else {
            return;
        };
        match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            Ok(id) => frame_loop.set_request(id),
            Err(err) => log::error!("requestAnimationFrame failed: {:?}", err),
        }
    }

    fn on_frame(&self) {
        let ticked = {
            let mut manager = self.manager.borrow_mut();
            manager.frame_loop_mut().take_request();
            manager.tick()
        };
        if ticked {
            self.schedule();
        }
    }

    /// Draw once when nothing else will, so input and resizes show up
    /// before a model is loaded.
    fn redraw_if_idle(&self) {
        let mut manager = self.manager.borrow_mut();
        if !manager.is_running() && !manager.frame_loop_handle().is_cancelled() {
            manager.redraw();
        }
    }

    fn on_resize(&self) {
        {
            let mut manager = self.manager.borrow_mut();
            manager.resize();
            let (width, height) = manager.canvas_size();
            size_canvas(&self.canvas, width, height, manager.renderer().pixel_ratio());
        }
        self.redraw_if_idle();
    }

    fn load(self: &Rc<Self>, url: String) {
        self.manager.borrow_mut().begin_load();
        let weak = Rc::downgrade(self);
        spawn_local(async move {
            let result = fetch_model(&url).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.manager.borrow().frame_loop_handle().is_cancelled() {
                return;
            }
            let attached = inner.manager.borrow_mut().on_model_loaded(result);
            if attached {
                inner.schedule();
            }
        });
    }

    fn dispose(&self) {
        let request = self.manager.borrow_mut().dispose();
        if let (Some(id), Some(window)) = (request, web_sys::window()) {
            if let Err(err) = window.cancel_animation_frame(id) {
                log::warn!("cancelAnimationFrame failed: {:?}", err);
            }
        }
        self.listeners.borrow_mut().clear();
        self.frame.borrow_mut().take();
        if let Some(button) = self.button.borrow_mut().take() {
            button.remove();
        }
        self.canvas.remove();
    }
}

/// Set the drawing buffer to physical pixels and the CSS box to `width`
/// by `height`.
fn size_canvas(canvas: &HtmlCanvasElement, width: u32, height: u32, pixel_ratio: f64) {
    canvas.set_width(((width as f64 * pixel_ratio) as u32).max(1));
    canvas.set_height(((height as f64 * pixel_ratio) as u32).max(1));
    let style = canvas.style();
    let _ = style.set_property("width", &format!("{}px", width));
    let _ = style.set_property("height", &format!("{}px", height));
    let _ = style.set_property("display", "block");
}

/// Fetch and parse a model.
async fn fetch_model(url: &str) -> Result<LoadedModel, LoadError> {
    let fetch_error = |err: JsValue| LoadError::Fetch {
        url: url.to_string(),
        message: err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    };

    let window = web_sys::window().ok_or_else(|| fetch_error(JsValue::from_str("No window object")))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(fetch_error)?
        .dyn_into()
        .map_err(fetch_error)?;
    if !response.ok() {
        return Err(LoadError::Fetch {
            url: url.to_string(),
            message: format!("HTTP {} {}", response.status(), response.status_text()),
        });
    }

    let buffer = JsFuture::from(response.array_buffer().map_err(fetch_error)?)
        .await
        .map_err(fetch_error)?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    log::debug!("Fetched {} bytes from {}", bytes.len(), url);
    GltfLoader::new().load_from_bytes(&bytes)
}

/// An animated model viewer mounted in the page.
///
/// Creates a canvas inside the configured container (or leaves it detached
/// when the container is missing), renders the studio scene, and plays the
/// first clip of a model once one is loaded. Call `dispose` to tear it
/// down; dropping the viewer does the same.
#[wasm_bindgen]
pub struct Viewer3D {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl Viewer3D {
    /// Mount a viewer. `config_json` overrides the defaults field by field.
    #[wasm_bindgen]
    pub async fn new(config_json: Option<String>) -> Result<Viewer3D, JsValue> {
        let config = match config_json {
            Some(json) => ViewerConfig::from_json(&json).map_err(js_error)?,
            None => ViewerConfig::default(),
        };

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;

        let viewport = WindowViewport.viewport();
        let (width, height) = config.layout.canvas_size(viewport);
        let pixel_ratio = config.renderer.pixel_ratio.unwrap_or(viewport.pixel_ratio);

        let canvas: HtmlCanvasElement = document
            .create_element("canvas")?
            .dyn_into()
            .map_err(|_| JsValue::from_str("Element is not a canvas"))?;
        size_canvas(&canvas, width, height, pixel_ratio);

        let container = document.get_element_by_id(&config.layout.container_id);
        match &container {
            Some(container) => {
                container.append_child(&canvas)?;
            }
            None => log::debug!(
                "Container '{}' not found, canvas left detached",
                config.layout.container_id
            ),
        }

        let button = match (&container, config.layout.load_button) {
            (Some(container), true) => {
                let button = document.create_element("button")?;
                button.set_text_content(Some(&config.model.label));
                container.insert_adjacent_element("afterend", &button)?;
                Some(button)
            }
            _ => None,
        };

        let context = Context::new(
            wgpu::SurfaceTarget::Canvas(canvas.clone()),
            canvas.width(),
            canvas.height(),
            &config.renderer,
        )
        .await
        .map_err(js_error)?;
        let renderer = GpuRenderer::new(context, width, height, pixel_ratio, &config.renderer);
        let manager = SceneManager::mount(config, renderer, Box::new(WindowViewport), Clock::new());

        let inner = Rc::new(Inner {
            manager: RefCell::new(manager),
            canvas,
            button: RefCell::new(button),
            frame: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        });

        let weak = Rc::downgrade(&inner);
        *inner.frame.borrow_mut() = Some(Closure::wrap(Box::new(move |_time: f64| {
            if let Some(inner) = weak.upgrade() {
                inner.on_frame();
            }
        }) as Box<dyn FnMut(f64)>));

        register_listeners(&inner, &window)?;

        Ok(Viewer3D { inner })
    }

    /// Fetch a glTF model and add it to the scene. Failures are logged.
    #[wasm_bindgen]
    pub fn load_model(&self, url: String) {
        self.inner.load(url);
    }

    /// Load the model named in the configuration.
    #[wasm_bindgen]
    pub fn load_default_model(&self) {
        let url = self.inner.manager.borrow().config().model.url.clone();
        self.inner.load(url);
    }

    /// Follow the window size. Also runs on every `resize` event.
    #[wasm_bindgen]
    pub fn resize(&self) {
        self.inner.on_resize();
    }

    /// Whether the frame loop is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.inner.manager.borrow().is_running()
    }

    /// Whether an animation mixer is bound to a loaded model.
    #[wasm_bindgen]
    pub fn has_mixer(&self) -> bool {
        self.inner.manager.borrow().mixer().is_some()
    }

    /// Frames produced by the loop so far.
    #[wasm_bindgen]
    pub fn frame_count(&self) -> u64 {
        self.inner.manager.borrow().frame_count()
    }

    /// Canvas size in CSS pixels, as `[width, height]`.
    #[wasm_bindgen]
    pub fn canvas_size(&self) -> Vec<u32> {
        let (width, height) = self.inner.manager.borrow().canvas_size();
        vec![width, height]
    }

    /// Stop the loop, remove every listener and detach the canvas.
    #[wasm_bindgen]
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl Drop for Viewer3D {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

fn register_listeners(inner: &Rc<Inner>, window: &web_sys::Window) -> Result<(), JsValue> {
    let canvas: &web_sys::EventTarget = inner.canvas.as_ref();
    let mut listeners = Vec::new();

    let weak = Rc::downgrade(inner);
    listeners.push(Listener::new(window.as_ref(), "resize", move |_event: Event| {
        if let Some(inner) = weak.upgrade() {
            inner.on_resize();
        }
    })?);

    let weak = Rc::downgrade(inner);
    listeners.push(Listener::new(canvas, "pointerdown", move |event: Event| {
        let (Some(inner), Some(event)) = (weak.upgrade(), event.dyn_ref::<PointerEvent>()) else {
            return;
        };
        let Some(button) = PointerButton::from_dom(event.button()) else {
            return;
        };
        inner.manager.borrow_mut().controls_mut().pointer_down(
            button,
            event.client_x() as f32,
            event.client_y() as f32,
            event.shift_key(),
        );
    })?);

    let weak = Rc::downgrade(inner);
    listeners.push(Listener::new(window.as_ref(), "pointermove", move |event: Event| {
        let (Some(inner), Some(event)) = (weak.upgrade(), event.dyn_ref::<PointerEvent>()) else {
            return;
        };
        let dragging = {
            let mut manager = inner.manager.borrow_mut();
            let controls = manager.controls_mut();
            controls.pointer_move(event.client_x() as f32, event.client_y() as f32);
            controls.is_dragging()
        };
        if dragging {
            inner.redraw_if_idle();
        }
    })?);

    let weak = Rc::downgrade(inner);
    listeners.push(Listener::new(window.as_ref(), "pointerup", move |_event: Event| {
        if let Some(inner) = weak.upgrade() {
            inner.manager.borrow_mut().controls_mut().pointer_up();
        }
    })?);

    let weak = Rc::downgrade(inner);
    listeners.push(Listener::new(canvas, "wheel", move |event: Event| {
        let (Some(inner), Some(wheel)) = (weak.upgrade(), event.dyn_ref::<WheelEvent>()) else {
            return;
        };
        event.prevent_default();
        inner.manager.borrow_mut().controls_mut().wheel(wheel.delta_y() as f32);
        inner.redraw_if_idle();
    })?);

    listeners.push(Listener::new(canvas, "contextmenu", |event: Event| {
        event.prevent_default();
    })?);

    if let Some(button) = inner.button.borrow().as_ref() {
        let weak = Rc::downgrade(inner);
        listeners.push(Listener::new(button.as_ref(), "click", move |_event: Event| {
            if let Some(inner) = weak.upgrade() {
                let url = inner.manager.borrow().config().model.url.clone();
                inner.load(url);
            }
        })?);
    }

    inner.listeners.borrow_mut().extend(listeners);
    Ok(())
}
