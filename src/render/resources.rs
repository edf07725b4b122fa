use super::backend::{Allocation, BufferRole, GraphicsBackend, ProgramKind};

pub const QUAD_VERTICES: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Destroyed,
}

/// One optional program per pass. A missing entry means the pass is unavailable.
pub struct ProgramSet<P> {
    programs: [Option<P>; 5],
}

impl<P> Default for ProgramSet<P> {
    fn default() -> Self {
        Self {
            programs: [None, None, None, None, None],
        }
    }
}

impl<P> ProgramSet<P> {
    pub fn get(&self, kind: ProgramKind) -> Option<&P> {
        self.programs[kind.index()].as_ref()
    }

    pub fn insert(&mut self, kind: ProgramKind, program: P) {
        self.programs[kind.index()] = Some(program);
    }

    pub fn remove(&mut self, kind: ProgramKind) -> Option<P> {
        self.programs[kind.index()].take()
    }

    pub fn is_available(&self, kind: ProgramKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn missing(&self) -> impl Iterator<Item = ProgramKind> + '_ {
        ProgramKind::ALL.into_iter().filter(|kind| !self.is_available(*kind))
    }

    pub fn clear(&mut self) {
        for slot in &mut self.programs {
            *slot = None;
        }
    }
}

pub struct GpuBuffer<H> {
    pub raw: H,
    pub role: BufferRole,
    /// Size in bytes; writes of a different size recreate the buffer.
    pub len: usize,
    /// Element count drawn from this buffer (LEDs, indices, vertices).
    pub count: u32,
}

pub struct RenderTarget<H> {
    pub raw: H,
    pub width: u32,
    pub height: u32,
}

/// Every GPU handle the pipeline draws with. Dropping a field releases it.
pub struct RenderResources<B: GraphicsBackend> {
    pub programs: ProgramSet<B::Program>,
    pub led_positions: Option<GpuBuffer<B::Buffer>>,
    pub led_colors: Option<GpuBuffer<B::Buffer>>,
    pub mesh_vertices: Option<GpuBuffer<B::Buffer>>,
    pub mesh_triangles: Option<GpuBuffer<B::Buffer>>,
    pub mesh_edges: Option<GpuBuffer<B::Buffer>>,
    pub quad: Option<GpuBuffer<B::Buffer>>,
    pub target: Option<RenderTarget<B::Target>>,
}

impl<B: GraphicsBackend> Default for RenderResources<B> {
    fn default() -> Self {
        Self {
            programs: ProgramSet::default(),
            led_positions: None,
            led_colors: None,
            mesh_vertices: None,
            mesh_triangles: None,
            mesh_edges: None,
            quad: None,
            target: None,
        }
    }
}

impl<B: GraphicsBackend> RenderResources<B> {
    pub fn buffer(&self, role: BufferRole) -> Option<&GpuBuffer<B::Buffer>> {
        match role {
            BufferRole::LedPositions => self.led_positions.as_ref(),
            BufferRole::LedColors => self.led_colors.as_ref(),
            BufferRole::MeshVertices => self.mesh_vertices.as_ref(),
            BufferRole::MeshTriangles => self.mesh_triangles.as_ref(),
            BufferRole::MeshEdges => self.mesh_edges.as_ref(),
            BufferRole::Quad => self.quad.as_ref(),
        }
    }

    fn buffer_slot(&mut self, role: BufferRole) -> &mut Option<GpuBuffer<B::Buffer>> {
        match role {
            BufferRole::LedPositions => &mut self.led_positions,
            BufferRole::LedColors => &mut self.led_colors,
            BufferRole::MeshVertices => &mut self.mesh_vertices,
            BufferRole::MeshTriangles => &mut self.mesh_triangles,
            BufferRole::MeshEdges => &mut self.mesh_edges,
            BufferRole::Quad => &mut self.quad,
        }
    }

    pub fn is_empty(&self) -> bool {
        ProgramKind::ALL.iter().all(|kind| !self.programs.is_available(*kind))
            && self.led_positions.is_none()
            && self.led_colors.is_none()
            && self.mesh_vertices.is_none()
            && self.mesh_triangles.is_none()
            && self.mesh_edges.is_none()
            && self.quad.is_none()
            && self.target.is_none()
    }

    /// Drops every handle. The off-screen target goes first since it is the
    /// largest allocation.
    fn release_all(&mut self) {
        self.target = None;
        self.quad = None;
        self.mesh_edges = None;
        self.mesh_triangles = None;
        self.mesh_vertices = None;
        self.led_colors = None;
        self.led_positions = None;
        self.programs.clear();
    }
}

/// Owns the backend and every resource allocated from it.
///
/// `Uninitialized -> Initialized -> Destroyed`, with re-initialization allowed
/// after a teardown. Allocations fail independently; a failed one only leaves
/// its own slot empty.
pub struct ResourceLifecycle<B: GraphicsBackend> {
    backend: B,
    state: LifecycleState,
    resources: RenderResources<B>,
    size: (u32, u32),
}

impl<B: GraphicsBackend> ResourceLifecycle<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: LifecycleState::Uninitialized,
            resources: RenderResources::default(),
            size: (1, 1),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == LifecycleState::Initialized
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn resources(&self) -> &RenderResources<B> {
        &self.resources
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn frame_parts(&mut self) -> (&mut B, &RenderResources<B>) {
        (&mut self.backend, &self.resources)
    }

    pub fn initialize(&mut self, width: u32, height: u32) {
        if self.state == LifecycleState::Initialized {
            log::warn!("Graphics resources already initialized; ignoring");
            return;
        }

        let (width, height) = (width.max(1), height.max(1));
        if self.size != (width, height) {
            self.backend.resize_surface(width, height);
        }
        self.size = (width, height);

        for kind in ProgramKind::ALL {
            match self.backend.create_program(kind) {
                Ok(program) => self.resources.programs.insert(kind, program),
                Err(err) => log::warn!("{err}; {} pass disabled", kind.label()),
            }
        }

        match self
            .backend
            .create_buffer(BufferRole::Quad, bytemuck::cast_slice(&QUAD_VERTICES))
        {
            Ok(raw) => {
                self.resources.quad = Some(GpuBuffer {
                    raw,
                    role: BufferRole::Quad,
                    len: std::mem::size_of_val(&QUAD_VERTICES),
                    count: QUAD_VERTICES.len() as u32,
                })
            }
            Err(err) => log::warn!("{err}; post-processing disabled"),
        }

        self.allocate_target();

        self.state = LifecycleState::Initialized;
        let missing: Vec<_> = self.resources.programs.missing().map(ProgramKind::label).collect();
        if missing.is_empty() {
            log::info!("Graphics resources initialized at {width}x{height}");
        } else {
            log::info!(
                "Graphics resources partially initialized at {width}x{height}, unavailable: {}",
                missing.join(", ")
            );
        }
    }

    fn allocate_target(&mut self) {
        let (width, height) = self.size;
        match self.backend.create_target(width, height) {
            Ok(raw) => self.resources.target = Some(RenderTarget { raw, width, height }),
            Err(err) => log::warn!("{err}; compositing without blur"),
        }
    }

    /// Reallocates only what scales with the canvas. Returns false when nothing changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let size = (width.max(1), height.max(1));
        if size == self.size {
            return false;
        }
        self.size = size;
        self.backend.resize_surface(size.0, size.1);

        if self.state == LifecycleState::Initialized {
            // Release before allocating so the old attachments are never alive twice.
            self.resources.target = None;
            self.allocate_target();
            log::debug!("Render target resized to {}x{}", size.0, size.1);
        }
        true
    }

    /// Releases everything. Safe to call repeatedly and after a partial initialize.
    pub fn teardown(&mut self) {
        match self.state {
            LifecycleState::Destroyed => {}
            LifecycleState::Uninitialized => {
                self.resources.release_all();
                self.state = LifecycleState::Destroyed;
            }
            LifecycleState::Initialized => {
                self.resources.release_all();
                self.state = LifecycleState::Destroyed;
                log::info!("Graphics resources released");
            }
        }
    }

    /// Releases whatever the backend reported as invalid after handing it out.
    /// The slot stays empty until the next upload or re-initialization.
    pub fn discard_failed(&mut self) {
        for allocation in self.backend.take_failed_allocations() {
            log::warn!("Releasing invalid {}", allocation.label());
            match allocation {
                Allocation::Program(kind) => {
                    self.resources.programs.remove(kind);
                }
                Allocation::Buffer(role) => *self.resources.buffer_slot(role) = None,
                Allocation::Target => self.resources.target = None,
            }
        }
    }

    /// Writes `contents` into the buffer for `role`, recreating it when the size
    /// changed. Empty contents release the buffer. Returns whether the data is
    /// now on the GPU.
    pub fn upload(&mut self, role: BufferRole, contents: &[u8], count: u32) -> bool {
        if self.state != LifecycleState::Initialized {
            log::trace!("Skipping {} upload, resources not initialized", role.label());
            return false;
        }

        let slot = self.resources.buffer_slot(role);
        if contents.is_empty() {
            *slot = None;
            return false;
        }

        if let Some(buffer) = slot.as_mut().filter(|b| b.len == contents.len()) {
            self.backend.write_buffer(&buffer.raw, contents);
            buffer.count = count;
            return true;
        }

        *slot = None;
        match self.backend.create_buffer(role, contents) {
            Ok(raw) => {
                *slot = Some(GpuBuffer {
                    raw,
                    role,
                    len: contents.len(),
                    count,
                });
                true
            }
            Err(err) => {
                log::warn!("{err}");
                false
            }
        }
    }
}

impl<B: GraphicsBackend> Drop for ResourceLifecycle<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
