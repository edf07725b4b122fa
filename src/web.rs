//! WASM entry point: a JS-callable viewer bound to a canvas element.

use crate::model::{LedColor, ModelGeometry};
use crate::render::{FrameOutcome, FramePipeline, GpuContext, WgpuBackend, ZoomLevel};
use crate::scene::SceneParameterSink;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

/// Forwards scene parameters to a JS `(id, value) => void` callback.
struct JsParameterSink(js_sys::Function);

impl SceneParameterSink for JsParameterSink {
    fn update(&mut self, id: &str, value: f32) {
        if let Err(err) = self
            .0
            .call2(&JsValue::NULL, &JsValue::from_str(id), &JsValue::from_f64(value as f64))
        {
            log::warn!("Scene parameter callback failed for {id}: {err:?}");
        }
    }
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn find_canvas(id: &str) -> Result<HtmlCanvasElement, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
        .ok_or_else(|| JsValue::from_str(&format!("no element with id '{id}'")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("element '{id}' is not a canvas")))
}

#[wasm_bindgen]
pub struct WebViewer {
    pipeline: FramePipeline<WgpuBackend>,
}

#[wasm_bindgen]
impl WebViewer {
    /// Acquires the GPU for the canvas with id `canvas_id`. Resources are not
    /// allocated until `initialize` is called.
    pub async fn create(canvas_id: String) -> Result<WebViewer, JsValue> {
        let canvas = find_canvas(&canvas_id)?;
        let (width, height) = (canvas.width().max(1), canvas.height().max(1));
        let context = GpuContext::from_canvas(canvas)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Viewer attached to '{canvas_id}' at {width}x{height}");
        Ok(WebViewer {
            pipeline: FramePipeline::new(WgpuBackend::new(context), width, height),
        })
    }

    pub fn initialize(&mut self) {
        self.pipeline.initialize();
    }

    #[wasm_bindgen(js_name = releaseGraphicsResources)]
    pub fn release_graphics_resources(&mut self) {
        self.pipeline.release_graphics_resources();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.pipeline.resize(width, height);
    }

    /// Renders one frame. `now` defaults to `performance.now()`. Returns false
    /// when the frame was throttled or nothing could be drawn.
    #[wasm_bindgen(js_name = renderFrame)]
    pub fn render_frame(&mut self, now: Option<f64>) -> bool {
        matches!(
            self.pipeline.render_frame(now.unwrap_or_else(now_ms)),
            FrameOutcome::Rendered(_)
        )
    }

    /// Flat arrays: LED xyz, vertex xyz, per-face vertex counts, concatenated face indices.
    #[wasm_bindgen(js_name = loadModel)]
    pub fn load_model(
        &mut self,
        name: String,
        led_positions: &[f32],
        vertices: &[f32],
        face_sizes: &[u32],
        face_indices: &[u32],
    ) -> Result<(), JsValue> {
        ModelGeometry::from_flat(name, led_positions, vertices, face_sizes, face_indices)
            .and_then(|model| self.pipeline.load_model(model))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // LED write interface

    #[wasm_bindgen(js_name = ledCount)]
    pub fn led_count(&self) -> usize {
        self.pipeline.led_count()
    }

    /// Packed RGB triples. Extra data is ignored; missing LEDs keep their colour.
    #[wasm_bindgen(js_name = setLedColors)]
    pub fn set_led_colors(&mut self, rgb: &[u8]) {
        let leds = self.pipeline.leds_mut();
        if rgb.len() != leds.len() * 3 {
            log::trace!("Colour data for {} LEDs, model has {}", rgb.len() / 3, leds.len());
        }
        for (led, c) in leds.iter_mut().zip(rgb.chunks_exact(3)) {
            *led = LedColor::new(c[0], c[1], c[2]);
        }
    }

    #[wasm_bindgen(js_name = setLed)]
    pub fn set_led(&mut self, index: usize, r: u8, g: u8, b: u8) -> bool {
        match self.pipeline.leds_mut().get_mut(index) {
            Some(led) => {
                *led = LedColor::new(r, g, b);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.pipeline.clear();
    }

    #[wasm_bindgen(js_name = setBrightness)]
    pub fn set_brightness(&mut self, brightness: u8) {
        self.pipeline.set_brightness(brightness);
    }

    pub fn brightness(&self) -> u8 {
        self.pipeline.brightness()
    }

    #[wasm_bindgen(js_name = deltaTime)]
    pub fn delta_time(&self) -> f32 {
        self.pipeline.delta_time()
    }

    pub fn millis(&self) -> u32 {
        self.pipeline.millis()
    }

    // Pointer events

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.pipeline.pointer_down(x, y);
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32, shift_held: bool) {
        self.pipeline.pointer_move(x, y, shift_held);
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.pipeline.pointer_up();
    }

    pub fn wheel(&mut self, delta: f32) {
        self.pipeline.wheel(delta);
    }

    // View controls

    #[wasm_bindgen(js_name = setLedSize)]
    pub fn set_led_size(&mut self, ratio: f32) {
        self.pipeline.set_led_size(ratio);
    }

    #[wasm_bindgen(js_name = setAtmosphereIntensity)]
    pub fn set_atmosphere_intensity(&mut self, intensity: f32) {
        self.pipeline.set_atmosphere_intensity(intensity);
    }

    #[wasm_bindgen(js_name = setLedSpacing)]
    pub fn set_led_spacing(&mut self, spacing: f32) {
        self.pipeline.set_led_spacing(spacing);
    }

    #[wasm_bindgen(js_name = setShowMesh)]
    pub fn set_show_mesh(&mut self, show: bool) {
        self.pipeline.set_show_mesh(show);
    }

    #[wasm_bindgen(js_name = setMeshOpacity)]
    pub fn set_mesh_opacity(&mut self, opacity: f32) {
        self.pipeline.set_mesh_opacity(opacity);
    }

    #[wasm_bindgen(js_name = setShowWireframe)]
    pub fn set_show_wireframe(&mut self, show: bool) {
        self.pipeline.set_show_wireframe(show);
    }

    /// 0 = close, 1 = normal, 2 = far. Other values are ignored.
    #[wasm_bindgen(js_name = setZoomLevel)]
    pub fn set_zoom_level(&mut self, level: i32) {
        self.pipeline.set_zoom_index(level);
    }

    #[wasm_bindgen(js_name = cycleZoomLevel)]
    pub fn cycle_zoom_level(&mut self) {
        let current = [ZoomLevel::Close, ZoomLevel::Normal, ZoomLevel::Far]
            .into_iter()
            .find(|level| level.distance() == self.pipeline.camera().distance())
            .unwrap_or(ZoomLevel::Far);
        self.pipeline.set_zoom_level(current.next());
    }

    #[wasm_bindgen(js_name = setAutoRotation)]
    pub fn set_auto_rotation(&mut self, enabled: bool, speed: Option<f32>) {
        self.pipeline.set_auto_rotation(enabled, speed);
    }

    #[wasm_bindgen(js_name = toggleAutoRotation)]
    pub fn toggle_auto_rotation(&mut self) {
        self.pipeline.toggle_auto_rotation();
    }

    #[wasm_bindgen(js_name = resetRotation)]
    pub fn reset_rotation(&mut self) {
        self.pipeline.reset_rotation();
    }

    #[wasm_bindgen(js_name = setViewAngle)]
    pub fn set_view_angle(&mut self, angle: f32) {
        self.pipeline.camera_mut().set_view_angle(angle);
    }

    // Scene parameters

    #[wasm_bindgen(js_name = setSceneParameterCallback)]
    pub fn set_scene_parameter_callback(&mut self, callback: js_sys::Function) {
        self.pipeline
            .set_scene_parameter_sink(JsParameterSink(callback));
    }

    #[wasm_bindgen(js_name = updateSceneParameter)]
    pub fn update_scene_parameter(&mut self, id: &str, value: f32) {
        self.pipeline.update_scene_parameter(id, value);
    }

    // Frame-rate controls

    #[wasm_bindgen(js_name = setMaxRefreshRate)]
    pub fn set_max_refresh_rate(&mut self, fps: u8) {
        self.pipeline.set_max_refresh_rate(fps);
    }

    #[wasm_bindgen(js_name = setDither)]
    pub fn set_dither(&mut self, level: u8) {
        self.pipeline.set_dither(level);
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("logger already set: {err}")));
    }
}
