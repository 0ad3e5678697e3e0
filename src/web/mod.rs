//! Web bindings for the viewer.
//!
//! This module provides the JavaScript-facing [`Viewer3D`] via wasm-bindgen,
//! plus the window viewport and event listener plumbing it is built from.

mod viewer;

pub use viewer::Viewer3D;

use crate::config::{ViewportProvider, ViewportSize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget};

/// Map a Rust error to a JavaScript string value.
pub(crate) fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Reads `innerWidth`, `innerHeight` and `devicePixelRatio` of the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowViewport;

impl ViewportProvider for WindowViewport {
    fn viewport(&self) -> ViewportSize {
        let Some(window) = web_sys::window() else {
            return ViewportSize::new(0, 0);
        };
        let dimension = |value: Result<JsValue, JsValue>| {
            value
                .ok()
                .and_then(|v| v.as_f64())
                .map(|v| v.max(0.0) as u32)
                .unwrap_or(0)
        };
        ViewportSize::new(dimension(window.inner_width()), dimension(window.inner_height()))
            .with_pixel_ratio(window.device_pixel_ratio())
    }
}

/// An event listener that is removed from its target when dropped.
pub(crate) struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    /// Register `handler` for `event` on `target`.
    pub(crate) fn new(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref())
        {
            log::warn!("Failed to remove '{}' listener: {:?}", self.event, err);
        }
    }
}
