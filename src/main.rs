use led_shell_webgpu::model::shapes::dodecahedron;
use led_shell_webgpu::render::{FramePipeline, GpuContext, WgpuBackend, ZoomLevel};
use led_shell_webgpu::LedColor;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Window, WindowId};

const LEDS_PER_FACE: u32 = 40;

struct App {
    window: Option<Arc<Window>>,
    viewer: Option<FramePipeline<WgpuBackend>>,
    start: Instant,
    mouse_pos: PhysicalPosition<f64>,
    modifiers: ModifiersState,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            viewer: None,
            start: Instant::now(),
            mouse_pos: PhysicalPosition::new(0.0, 0.0),
            modifiers: ModifiersState::empty(),
        }
    }

    /// Scrolling rainbow, one hue band per face.
    fn animate(viewer: &mut FramePipeline<WgpuBackend>) {
        let t = viewer.millis() as f32 / 1000.0;
        let count = viewer.led_count().max(1) as f32;
        for (i, led) in viewer.leds_mut().iter_mut().enumerate() {
            let hue = (i as f32 / count + t * 0.1).fract();
            *led = hue_to_rgb(hue);
        }
    }

    fn create_viewer(window: Arc<Window>) -> Option<FramePipeline<WgpuBackend>> {
        let size = window.inner_size();
        let context = match pollster::block_on(GpuContext::new(window)) {
            Ok(context) => context,
            Err(e) => {
                log::error!("GPU initialization failed: {e}");
                return None;
            }
        };

        let mut viewer = FramePipeline::new(WgpuBackend::new(context), size.width, size.height);
        if let Err(e) = viewer.load_model(dodecahedron(10.0, LEDS_PER_FACE)) {
            log::error!("Failed to load demo model: {e}");
        }
        viewer.set_auto_rotation(true, None);
        viewer.initialize();
        Some(viewer)
    }
}

fn hue_to_rgb(hue: f32) -> LedColor {
    let h = hue * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    LedColor::new((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("LED Shell Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        self.viewer = Self::create_viewer(window.clone());
        if self.viewer.is_none() {
            event_loop.exit();
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                viewer.release_graphics_resources();
                event_loop.exit();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        match code {
                            KeyCode::Escape => {
                                viewer.release_graphics_resources();
                                event_loop.exit();
                            }
                            KeyCode::Digit1 => viewer.set_zoom_level(ZoomLevel::Close),
                            KeyCode::Digit2 => viewer.set_zoom_level(ZoomLevel::Normal),
                            KeyCode::Digit3 => viewer.set_zoom_level(ZoomLevel::Far),
                            KeyCode::KeyA => viewer.toggle_auto_rotation(),
                            KeyCode::KeyR => viewer.reset_rotation(),
                            KeyCode::KeyM => {
                                let show = !viewer.settings().show_mesh();
                                viewer.set_show_mesh(show);
                            }
                            KeyCode::KeyW => {
                                let show = !viewer.settings().show_wireframe();
                                viewer.set_show_wireframe(show);
                            }
                            _ => {}
                        }
                    }
                }
            }
            WindowEvent::Resized(size) => {
                viewer.resize(size.width, size.height);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    viewer.pointer_down(self.mouse_pos.x as f32, self.mouse_pos.y as f32)
                }
                ElementState::Released => viewer.pointer_up(),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_pos = position;
                viewer.pointer_move(
                    position.x as f32,
                    position.y as f32,
                    self.modifiers.shift_key(),
                );
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // Browser convention: positive delta scrolls down and zooms out.
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * 100.0,
                    MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                };
                viewer.wheel(delta);
            }
            WindowEvent::RedrawRequested => {
                Self::animate(viewer);
                viewer.render_frame(self.start.elapsed().as_secs_f64() * 1000.0);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {e}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {e}");
    }
}
