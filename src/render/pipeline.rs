//! Per-frame orchestration: timing, camera, uploads and the fixed pass sequence.

use super::backend::{
    BufferRole, FrameCommands, GraphicsBackend, PassCommand, PostUniforms, ProgramKind,
    SceneUniforms,
};
use super::camera::{CameraState, Projection, ZoomLevel};
use super::controller::InteractionController;
use super::frame::FrameState;
use super::mesh::MeshData;
use super::resources::{LifecycleState, RenderResources, ResourceLifecycle};
use crate::config::{
    ViewSettings, COLOR_BRIGHTNESS_BOOST, DEFAULT_BRIGHTNESS, MAX_DEPTH_FADE, MIN_DEPTH_FADE,
    MIN_LED_BRIGHTNESS,
};
use crate::error::ModelError;
use crate::model::{LedBuffer, LedColor, ModelGeometry};
use crate::scene::{IgnoreParameters, SceneParameterSink};

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub passes: Vec<ProgramKind>,
    pub offscreen: bool,
    pub delta: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Arrived before the refresh cap allowed another frame. Nothing changed.
    Throttled,
    /// Time and camera advanced but there was nothing to draw with.
    NoResources,
    Rendered(FrameReport),
}

/// Owns every piece of per-viewer state and turns one host callback into one frame.
pub struct FramePipeline<B: GraphicsBackend> {
    lifecycle: ResourceLifecycle<B>,
    camera: CameraState,
    controller: InteractionController,
    frame: FrameState,
    projection: Projection,
    settings: ViewSettings,
    leds: LedBuffer,
    mesh: MeshData,
    mesh_dirty: bool,
    face_edge: Option<f32>,
    model_name: String,
    brightness: u8,
    scene_sink: Box<dyn SceneParameterSink>,
    color_staging: Vec<[u8; 4]>,
    warned: [bool; 5],
}

impl<B: GraphicsBackend> FramePipeline<B> {
    pub fn new(backend: B, width: u32, height: u32) -> Self {
        let frame = FrameState::new(width, height);
        let mut projection = Projection::default();
        projection.set_aspect(width, height);

        Self {
            lifecycle: ResourceLifecycle::new(backend),
            camera: CameraState::new(),
            controller: InteractionController::new(),
            frame,
            projection,
            settings: ViewSettings::default(),
            leds: LedBuffer::default(),
            mesh: MeshData::default(),
            mesh_dirty: false,
            face_edge: None,
            model_name: String::new(),
            brightness: DEFAULT_BRIGHTNESS,
            scene_sink: Box::new(IgnoreParameters),
            color_staging: Vec::new(),
            warned: [false; 5],
        }
    }

    // ---- lifecycle -------------------------------------------------------

    pub fn initialize(&mut self) {
        if self.lifecycle.is_initialized() {
            log::warn!("initialize called twice; ignoring");
            return;
        }
        let (width, height) = self.frame.size();
        self.lifecycle.initialize(width, height);
        self.warned = [false; 5];
        // Fresh buffers need the current model again.
        self.leds.mark_dirty();
        self.mesh_dirty = true;
    }

    /// Idempotent; the pipeline can be initialized again afterwards.
    pub fn release_graphics_resources(&mut self) {
        self.lifecycle.teardown();
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn resources(&self) -> &RenderResources<B> {
        self.lifecycle.resources()
    }

    pub fn backend(&self) -> &B {
        self.lifecycle.backend()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.frame.set_size(width, height) {
            return;
        }
        let (width, height) = self.frame.size();
        self.projection.set_aspect(width, height);
        self.lifecycle.resize(width, height);
    }

    // ---- model -----------------------------------------------------------

    /// Validates and installs a new model. A rejected model leaves the current one in place.
    pub fn load_model(&mut self, model: ModelGeometry) -> Result<(), ModelError> {
        if let Err(err) = model.validate() {
            log::warn!("Rejected model '{}': {err}", model.name);
            return Err(err);
        }

        self.mesh = MeshData::from_geometry(&model);
        self.mesh_dirty = true;
        self.face_edge = model.mean_edge_length();
        self.leds.replace(model.led_positions);
        self.model_name = model.name;

        log::info!(
            "Loaded model '{}': {} LEDs, {} triangles",
            self.model_name,
            self.leds.len(),
            self.mesh.triangle_count()
        );
        Ok(())
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    // ---- LED write interface ---------------------------------------------

    pub fn led_count(&self) -> usize {
        self.leds.len()
    }

    pub fn leds(&self) -> &LedBuffer {
        &self.leds
    }

    pub fn leds_mut(&mut self) -> &mut [LedColor] {
        self.leds.colors_mut()
    }

    pub fn clear(&mut self) {
        self.leds.clear();
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    pub fn delta_time(&self) -> f32 {
        self.frame.delta_time()
    }

    pub fn millis(&self) -> u32 {
        self.frame.millis()
    }

    // ---- input -----------------------------------------------------------

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.controller.on_pointer_down(x, y);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, shift_held: bool) {
        self.controller.on_pointer_move(x, y, shift_held, &mut self.camera);
    }

    pub fn pointer_up(&mut self) {
        self.controller.on_pointer_up();
    }

    pub fn wheel(&mut self, delta: f32) {
        self.controller.on_wheel(delta, &mut self.camera);
    }

    // ---- view controls ---------------------------------------------------

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn set_led_size(&mut self, ratio: f32) {
        self.settings.set_led_size(ratio);
    }

    pub fn set_atmosphere_intensity(&mut self, intensity: f32) {
        self.settings.set_atmosphere_intensity(intensity);
    }

    pub fn set_led_spacing(&mut self, spacing: f32) {
        self.settings.set_led_spacing(spacing);
    }

    pub fn set_show_mesh(&mut self, show: bool) {
        self.settings.set_show_mesh(show);
    }

    pub fn set_mesh_opacity(&mut self, opacity: f32) {
        self.settings.set_mesh_opacity(opacity);
    }

    pub fn set_show_wireframe(&mut self, show: bool) {
        self.settings.set_show_wireframe(show);
    }

    pub fn set_zoom_level(&mut self, level: ZoomLevel) {
        self.controller.set_zoom_level(level, &mut self.camera);
    }

    /// Host-facing zoom by index. Unknown indices are ignored.
    pub fn set_zoom_index(&mut self, index: i32) -> bool {
        match ZoomLevel::from_index(index) {
            Some(level) => {
                self.set_zoom_level(level);
                true
            }
            None => {
                log::warn!("Ignoring unknown zoom level {index}");
                false
            }
        }
    }

    pub fn set_auto_rotation(&mut self, enabled: bool, speed: Option<f32>) {
        self.controller.set_auto_rotation(enabled, speed, &mut self.camera);
    }

    pub fn toggle_auto_rotation(&mut self) {
        self.camera.toggle_auto_rotation();
    }

    pub fn reset_rotation(&mut self) {
        self.controller.reset_rotation(&mut self.camera);
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraState {
        &mut self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn set_max_refresh_rate(&mut self, fps: u8) {
        self.frame.set_max_refresh_rate(fps);
    }

    pub fn set_dither(&mut self, level: u8) {
        self.frame.set_dither(level);
    }

    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    pub fn set_scene_parameter_sink(&mut self, sink: impl SceneParameterSink + 'static) {
        self.scene_sink = Box::new(sink);
    }

    pub fn update_scene_parameter(&mut self, id: &str, value: f32) {
        self.scene_sink.update(id, value);
    }

    // ---- frame -----------------------------------------------------------

    /// Runs one frame at host time `now_ms`. Never fails: missing resources
    /// degrade the frame instead.
    pub fn render_frame(&mut self, now_ms: f64) -> FrameOutcome {
        let Some(delta) = self.frame.begin_frame(now_ms) else {
            return FrameOutcome::Throttled;
        };

        self.controller.advance(delta, &mut self.camera);

        let scene = self.scene_uniforms();

        if !self.lifecycle.is_initialized() {
            log::trace!("Frame {} skipped, no graphics resources", self.frame.frame_count());
            return FrameOutcome::NoResources;
        }

        self.lifecycle.discard_failed();
        self.upload_dirty_data();

        let (width, height) = self.frame.size();
        let atmosphere = self.settings.atmosphere_intensity();
        let show_mesh = self.settings.show_mesh();
        let wireframe = self.settings.show_wireframe();
        let dither = self.frame.dither();
        let warned = &mut self.warned;

        let (backend, resources) = self.lifecycle.frame_parts();
        let programs = &resources.programs;
        let mut passes = Vec::with_capacity(5);

        if show_mesh {
            let indices = if wireframe {
                resources.mesh_edges.as_ref()
            } else {
                resources.mesh_triangles.as_ref()
            };
            match (programs.get(ProgramKind::Mesh), resources.mesh_vertices.as_ref(), indices) {
                (None, _, _) => warn_unavailable(warned, ProgramKind::Mesh),
                (Some(program), Some(vertices), Some(indices)) => passes.push(PassCommand::Mesh {
                    program,
                    vertices: &vertices.raw,
                    indices: &indices.raw,
                    index_count: indices.count,
                    wireframe,
                }),
                _ => log::trace!("No mesh geometry to draw"),
            }
        }

        if let (Some(positions), Some(colors)) =
            (resources.led_positions.as_ref(), resources.led_colors.as_ref())
        {
            let led_count = positions.count.min(colors.count);
            match programs.get(ProgramKind::Glow) {
                Some(program) => passes.push(PassCommand::Glow {
                    program,
                    positions: &positions.raw,
                    colors: &colors.raw,
                    led_count,
                }),
                None => warn_unavailable(warned, ProgramKind::Glow),
            }
            match programs.get(ProgramKind::Led) {
                Some(program) => passes.push(PassCommand::Leds {
                    program,
                    positions: &positions.raw,
                    colors: &colors.raw,
                    led_count,
                }),
                None => warn_unavailable(warned, ProgramKind::Led),
            }
        }

        // Post-processing needs the target, the quad and a composite program;
        // without them the scene goes straight to the canvas.
        let post = match (
            resources.target.as_ref(),
            resources.quad.as_ref(),
            programs.get(ProgramKind::Composite),
        ) {
            (Some(target), Some(quad), Some(composite)) => Some((target, quad, composite)),
            (_, _, None) => {
                warn_unavailable(warned, ProgramKind::Composite);
                None
            }
            _ => None,
        };

        let mut blurred = false;
        if let Some((target, quad, composite)) = post {
            match programs.get(ProgramKind::Blur) {
                Some(program) => {
                    passes.push(PassCommand::Blur {
                        program,
                        target: &target.raw,
                        quad: &quad.raw,
                    });
                    blurred = true;
                }
                None => warn_unavailable(warned, ProgramKind::Blur),
            }
            passes.push(PassCommand::Composite {
                program: composite,
                target: &target.raw,
                quad: &quad.raw,
                blurred,
            });
        }

        let report = FrameReport {
            passes: passes.iter().map(PassCommand::kind).collect(),
            offscreen: post.is_some(),
            delta,
        };

        let commands = FrameCommands {
            scene,
            post: PostUniforms {
                texel_size: [1.0 / width as f32, 1.0 / height as f32],
                glow_strength: if blurred { atmosphere } else { 0.0 },
                dither: dither as f32,
            },
            offscreen: post.map(|(target, _, _)| &target.raw),
            passes,
        };

        if let Err(err) = backend.submit(commands) {
            log::warn!("Frame {} not presented: {err}", self.frame.frame_count());
        }
        log::trace!("Frame {} rendered: {:?}", self.frame.frame_count(), report.passes);

        FrameOutcome::Rendered(report)
    }

    fn scene_uniforms(&self) -> SceneUniforms {
        SceneUniforms {
            projection: self.projection.matrix().to_cols_array_2d(),
            view: self.camera.view_matrix().to_cols_array_2d(),
            model: self.camera.model_rotation_matrix().to_cols_array_2d(),
            led_params: [
                self.settings.led_world_size(self.face_edge),
                self.settings.atmosphere_intensity(),
                self.brightness as f32 / 255.0 * COLOR_BRIGHTNESS_BOOST,
                self.settings.mesh_opacity(),
            ],
            fade_params: [
                MIN_LED_BRIGHTNESS,
                MAX_DEPTH_FADE,
                MIN_DEPTH_FADE,
                self.camera.center_depth(),
            ],
        }
    }

    /// Positions and mesh only when changed; colours every frame.
    fn upload_dirty_data(&mut self) {
        let count = self.leds.len() as u32;

        if self.leds.is_dirty() {
            let positions = self.leds.position_data();
            self.lifecycle
                .upload(BufferRole::LedPositions, bytemuck::cast_slice(&positions), count);
            self.leds.mark_clean();
        }

        self.leds.pack_colors(&mut self.color_staging);
        self.lifecycle
            .upload(BufferRole::LedColors, bytemuck::cast_slice(&self.color_staging), count);

        if self.mesh_dirty {
            let mesh = &self.mesh;
            self.lifecycle.upload(
                BufferRole::MeshVertices,
                bytemuck::cast_slice(&mesh.vertices),
                mesh.vertices.len() as u32,
            );
            self.lifecycle.upload(
                BufferRole::MeshTriangles,
                bytemuck::cast_slice(&mesh.triangles),
                mesh.triangles.len() as u32,
            );
            self.lifecycle.upload(
                BufferRole::MeshEdges,
                bytemuck::cast_slice(&mesh.edges),
                mesh.edges.len() as u32,
            );
            self.mesh_dirty = false;
        }
    }
}

/// Warns the first time a pass is skipped after initialization, traces afterwards.
fn warn_unavailable(warned: &mut [bool; 5], kind: ProgramKind) {
    let slot = &mut warned[kind.index()];
    if *slot {
        log::trace!("Skipping {} pass", kind.label());
    } else {
        log::warn!("{} program unavailable; skipping pass", kind.label());
        *slot = true;
    }
}
