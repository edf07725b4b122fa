//! The seam between frame orchestration and the graphics API.
//!
//! [`GraphicsBackend`] creates opaque resources and executes an ordered list of
//! [`PassCommand`]s. Resources release themselves when dropped, so whoever owns a
//! handle decides its lifetime.

use crate::error::ResourceError;
use bytemuck::{Pod, Zeroable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Led,
    Mesh,
    Glow,
    Blur,
    Composite,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 5] = [
        ProgramKind::Led,
        ProgramKind::Mesh,
        ProgramKind::Glow,
        ProgramKind::Blur,
        ProgramKind::Composite,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProgramKind::Led => "led",
            ProgramKind::Mesh => "mesh",
            ProgramKind::Glow => "glow",
            ProgramKind::Blur => "blur",
            ProgramKind::Composite => "composite",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            ProgramKind::Led => 0,
            ProgramKind::Mesh => 1,
            ProgramKind::Glow => 2,
            ProgramKind::Blur => 3,
            ProgramKind::Composite => 4,
        }
    }
}

/// What a GPU buffer holds, which also decides its usage flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    LedPositions,
    LedColors,
    MeshVertices,
    MeshTriangles,
    MeshEdges,
    Quad,
}

impl BufferRole {
    pub fn label(self) -> &'static str {
        match self {
            BufferRole::LedPositions => "led positions",
            BufferRole::LedColors => "led colors",
            BufferRole::MeshVertices => "mesh vertices",
            BufferRole::MeshTriangles => "mesh triangles",
            BufferRole::MeshEdges => "mesh edges",
            BufferRole::Quad => "composite quad",
        }
    }

    pub fn is_index(self) -> bool {
        matches!(self, BufferRole::MeshTriangles | BufferRole::MeshEdges)
    }
}

/// Identifies a slot in the resource set, for failures reported after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Allocation {
    Program(ProgramKind),
    Buffer(BufferRole),
    Target,
}

impl Allocation {
    pub fn label(self) -> &'static str {
        match self {
            Allocation::Program(kind) => kind.label(),
            Allocation::Buffer(role) => role.label(),
            Allocation::Target => "render target",
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SceneUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// x: LED sprite diameter, y: atmosphere intensity, z: brightness, w: mesh opacity.
    pub led_params: [f32; 4],
    /// x: minimum LED brightness, y: max depth fade, z: min depth fade, w: centre depth.
    pub fade_params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PostUniforms {
    pub texel_size: [f32; 2],
    /// Weight of the blurred layer in the composite, 0 when blur was skipped.
    pub glow_strength: f32,
    pub dither: f32,
}

/// One draw step. Commands borrow resources for the duration of a frame only.
pub enum PassCommand<'a, B: GraphicsBackend> {
    Mesh {
        program: &'a B::Program,
        vertices: &'a B::Buffer,
        indices: &'a B::Buffer,
        index_count: u32,
        wireframe: bool,
    },
    Glow {
        program: &'a B::Program,
        positions: &'a B::Buffer,
        colors: &'a B::Buffer,
        led_count: u32,
    },
    Leds {
        program: &'a B::Program,
        positions: &'a B::Buffer,
        colors: &'a B::Buffer,
        led_count: u32,
    },
    Blur {
        program: &'a B::Program,
        target: &'a B::Target,
        quad: &'a B::Buffer,
    },
    Composite {
        program: &'a B::Program,
        target: &'a B::Target,
        quad: &'a B::Buffer,
        blurred: bool,
    },
}

impl<B: GraphicsBackend> PassCommand<'_, B> {
    pub fn kind(&self) -> ProgramKind {
        match self {
            PassCommand::Mesh { .. } => ProgramKind::Mesh,
            PassCommand::Glow { .. } => ProgramKind::Glow,
            PassCommand::Leds { .. } => ProgramKind::Led,
            PassCommand::Blur { .. } => ProgramKind::Blur,
            PassCommand::Composite { .. } => ProgramKind::Composite,
        }
    }
}

pub struct FrameCommands<'a, B: GraphicsBackend> {
    pub scene: SceneUniforms,
    pub post: PostUniforms,
    /// Scene passes render here when set, otherwise straight to the canvas.
    pub offscreen: Option<&'a B::Target>,
    pub passes: Vec<PassCommand<'a, B>>,
}

pub trait GraphicsBackend: Sized {
    type Program;
    type Buffer;
    type Target;

    fn create_program(&mut self, kind: ProgramKind) -> Result<Self::Program, ResourceError>;

    fn create_buffer(&mut self, role: BufferRole, contents: &[u8]) -> Result<Self::Buffer, ResourceError>;

    /// Overwrites the start of `buffer`. `contents` never exceeds the size it was created with.
    fn write_buffer(&mut self, buffer: &Self::Buffer, contents: &[u8]);

    fn create_target(&mut self, width: u32, height: u32) -> Result<Self::Target, ResourceError>;

    fn resize_surface(&mut self, width: u32, height: u32);

    fn submit(&mut self, frame: FrameCommands<'_, Self>) -> Result<(), ResourceError>;

    /// Allocations that were handed out but turned out to be invalid once the
    /// device finished validating them. Drained on every call.
    fn take_failed_allocations(&mut self) -> Vec<Allocation> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 224);
        assert_eq!(std::mem::size_of::<PostUniforms>(), 16);
    }

    #[test]
    fn program_indices_are_distinct() {
        let mut seen = [false; 5];
        for kind in ProgramKind::ALL {
            assert!(!seen[kind.index()]);
            seen[kind.index()] = true;
        }
    }

    #[test]
    fn only_mesh_buffers_are_indices() {
        assert!(BufferRole::MeshEdges.is_index());
        assert!(!BufferRole::LedColors.is_index());
    }
}
