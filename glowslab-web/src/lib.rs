/// glowslab Web - WASM entry point rendering the slab through WebGL 2
///
/// The browser's `requestAnimationFrame` callback is the scheduler: every
/// frame runs one orchestrator tick and requests the next frame only if
/// the tick asked for it.

use std::cell::RefCell;
use std::rc::Rc;

use glowslab_core::{Display, FrameRequest, RenderOrchestrator, SceneConfig};
use log::{error, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlCanvasElement};

pub mod gl_backend;

pub use gl_backend::WebGlBackend;

type FrameCallback = Closure<dyn FnMut(f64)>;

/// DOM element showing the FPS readout
struct ElementDisplay {
    element: Element,
}

impl Display for ElementDisplay {
    fn set_text(&mut self, text: &str) {
        self.element.set_text_content(Some(text));
    }
}

fn element_by_id(id: &str) -> Result<Element, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document available"))?
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", id)))
}

fn request_animation_frame(callback: &FrameCallback) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no global window exists"))?
        .request_animation_frame(callback.as_ref().unchecked_ref())
}

#[wasm_bindgen]
pub struct WebRenderer {
    orchestrator: RenderOrchestrator,
    backend: WebGlBackend,
    display: ElementDisplay,
}

#[wasm_bindgen]
impl WebRenderer {
    /// Set up the scene on the canvas `canvas_id`, writing FPS into `message_id`
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, message_id: &str, layer_count: Option<u32>) -> Result<WebRenderer, JsValue> {
        let mut config = SceneConfig::default();
        if let Some(layers) = layer_count {
            config = config.with_layer_count(layers as usize);
        }

        let canvas = element_by_id(canvas_id)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str(&format!("'{}' is not a canvas", canvas_id)))?;
        canvas.set_width(config.viewport_width);
        canvas.set_height(config.viewport_height);

        let mut backend = WebGlBackend::from_canvas(&canvas)?;
        let orchestrator = RenderOrchestrator::new(config, &mut backend).map_err(|e| {
            error!("Initialization failed: {}", e);
            JsValue::from_str(&e.to_string())
        })?;
        let display = ElementDisplay {
            element: element_by_id(message_id)?,
        };

        info!(
            "glowslab ready with {} layers",
            orchestrator.config().layer_count
        );
        Ok(WebRenderer {
            orchestrator,
            backend,
            display,
        })
    }

    /// Run one frame; returns whether another frame should be requested
    pub fn tick(&mut self, timestamp: f64) -> bool {
        let request = self
            .orchestrator
            .tick(timestamp, &mut self.backend, &mut self.display);
        request == FrameRequest::Continue
    }

    /// Stop the animation after the current frame
    pub fn stop(&mut self) {
        self.orchestrator.cancel();
    }
}

/// Handle to a running animation loop
#[wasm_bindgen]
pub struct FrameLoop {
    renderer: Rc<RefCell<WebRenderer>>,
}

#[wasm_bindgen]
impl FrameLoop {
    pub fn stop(&self) {
        self.renderer.borrow_mut().stop();
    }
}

/// Create the scene and drive it from `requestAnimationFrame`
#[wasm_bindgen(js_name = runScene)]
pub fn run_scene(canvas_id: &str, message_id: &str, layer_count: Option<u32>) -> Result<FrameLoop, JsValue> {
    let renderer = Rc::new(RefCell::new(WebRenderer::new(canvas_id, message_id, layer_count)?));

    let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    let next = callback.clone();
    let frame_renderer = renderer.clone();
    *callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
        if !frame_renderer.borrow_mut().tick(timestamp) {
            info!("Animation stopped");
            return;
        }
        if let Some(cb) = next.borrow().as_ref() {
            if let Err(e) = request_animation_frame(cb) {
                error!("Could not schedule next frame: {:?}", e);
            }
        }
    }));

    if let Some(cb) = callback.borrow().as_ref() {
        request_animation_frame(cb)?;
    }
    Ok(FrameLoop { renderer })
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Setup panic hook for better error messages in browser console
    console_error_panic_hook::set_once();
    // Ignore double initialisation when the module is instantiated twice
    let _ = console_log::init_with_level(log::Level::Info);

    Ok(())
}
