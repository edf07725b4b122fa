//! # led-shell-webgpu
//!
//! An interactive WebGPU viewer for addressable LED arrays mapped onto a
//! polyhedral shell.
//!
//! ## Features
//! - Orbit camera with turntable model rotation, tilt, zoom presets and auto-rotation
//! - Fixed multi-pass pipeline: translucent mesh, LED glow, blur and composite
//! - Resource lifecycle that survives partial allocation failure and repeated teardown
//! - Frame pacing with a refresh cap for host-driven animation callbacks
//! - Cross-platform: Native + WASM support
//!
//! ## Example
//! ```rust,ignore
//! use led_shell_webgpu::model::shapes::dodecahedron;
//! use led_shell_webgpu::render::{FramePipeline, GpuContext, WgpuBackend};
//!
//! let context = pollster::block_on(GpuContext::new(window))?;
//! let mut viewer = FramePipeline::new(WgpuBackend::new(context), 1280, 720);
//! viewer.load_model(dodecahedron(10.0, 20))?;
//! viewer.initialize();
//!
//! // Every animation frame:
//! for led in viewer.leds_mut() {
//!     *led = LedColor::new(255, 80, 0);
//! }
//! viewer.render_frame(now_ms);
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod scene;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::ViewSettings;
pub use error::{GpuInitError, ModelError, ResourceError};
pub use model::{LedBuffer, LedColor, ModelGeometry, ModelGeometryBuilder};
pub use render::{CameraState, FrameOutcome, FramePipeline, ZoomLevel};
pub use scene::SceneParameterSink;
