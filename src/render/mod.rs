//! Rendering: camera math, interaction, frame pacing and the pass orchestrator.
//!
//! Everything above [`backend::GraphicsBackend`] is GPU-agnostic; `context`,
//! `wgpu_backend` and `shaders` are the wgpu implementation.

pub mod backend;
pub mod camera;
pub mod context;
pub mod controller;
pub mod frame;
pub mod mesh;
pub mod pipeline;
pub mod resources;
pub mod shaders;
pub mod wgpu_backend;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{Allocation, BufferRole, GraphicsBackend, PassCommand, ProgramKind};
pub use camera::{CameraState, Projection, ZoomLevel};
pub use context::GpuContext;
pub use controller::{DragAction, InteractionController};
pub use frame::FrameState;
pub use mesh::{MeshData, Vertex};
pub use pipeline::{FrameOutcome, FramePipeline, FrameReport};
pub use resources::{LifecycleState, RenderResources, ResourceLifecycle};
pub use wgpu_backend::WgpuBackend;
