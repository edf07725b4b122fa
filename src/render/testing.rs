//! A [`GraphicsBackend`] that records what it is asked to do, for tests.

use super::backend::{
    Allocation, BufferRole, FrameCommands, GraphicsBackend, PassCommand, PostUniforms, ProgramKind,
    SceneUniforms,
};
use crate::error::ResourceError;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Program(ProgramKind),
    Buffer(BufferRole),
    Target { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Created(u32, Resource),
    Released(u32, Resource),
    Written(Resource, usize),
    SurfaceResized(u32, u32),
    Submitted(Vec<ProgramKind>),
}

/// What the last submitted frame looked like.
#[derive(Debug, Clone)]
pub struct SubmittedFrame {
    pub passes: Vec<ProgramKind>,
    pub offscreen: bool,
    pub scene: SceneUniforms,
    pub post: PostUniforms,
    pub wireframe: Option<bool>,
    pub composite_blurred: Option<bool>,
    pub led_count: Option<u32>,
}

#[derive(Default)]
struct Failures {
    programs: HashSet<ProgramKind>,
    buffers: bool,
    targets: bool,
}

#[derive(Default)]
struct Shared {
    events: RefCell<Vec<Event>>,
    live: Cell<i64>,
    next_id: Cell<u32>,
    failures: RefCell<Failures>,
    late_failures: RefCell<Vec<Allocation>>,
    last_frame: RefCell<Option<SubmittedFrame>>,
}

/// Releases itself into the event log when dropped.
#[derive(Debug)]
pub struct MockHandle {
    pub id: u32,
    pub resource: Resource,
    shared: Rc<Shared>,
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared").field("live", &self.live.get()).finish()
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.shared.live.set(self.shared.live.get() - 1);
        self.shared
            .events
            .borrow_mut()
            .push(Event::Released(self.id, self.resource));
    }
}

pub struct RecordingBackend {
    shared: Rc<Shared>,
}

/// Test-side view of a [`RecordingBackend`] that has been moved into a lifecycle.
#[derive(Clone)]
pub struct Recorder {
    shared: Rc<Shared>,
}

impl RecordingBackend {
    pub fn new() -> (Self, Recorder) {
        let shared = Rc::new(Shared::default());
        (
            Self {
                shared: shared.clone(),
            },
            Recorder { shared },
        )
    }

    fn allocate(&mut self, resource: Resource) -> MockHandle {
        let id = self.shared.next_id.get();
        self.shared.next_id.set(id + 1);
        self.shared.live.set(self.shared.live.get() + 1);
        self.shared
            .events
            .borrow_mut()
            .push(Event::Created(id, resource));
        MockHandle {
            id,
            resource,
            shared: self.shared.clone(),
        }
    }
}

impl GraphicsBackend for RecordingBackend {
    type Program = MockHandle;
    type Buffer = MockHandle;
    type Target = MockHandle;

    fn create_program(&mut self, kind: ProgramKind) -> Result<MockHandle, ResourceError> {
        if self.shared.failures.borrow().programs.contains(&kind) {
            return Err(ResourceError::Program(kind.label(), "link failed".into()));
        }
        Ok(self.allocate(Resource::Program(kind)))
    }

    fn create_buffer(&mut self, role: BufferRole, _contents: &[u8]) -> Result<MockHandle, ResourceError> {
        if self.shared.failures.borrow().buffers {
            return Err(ResourceError::Buffer(role.label(), "out of memory".into()));
        }
        Ok(self.allocate(Resource::Buffer(role)))
    }

    fn write_buffer(&mut self, buffer: &MockHandle, contents: &[u8]) {
        self.shared
            .events
            .borrow_mut()
            .push(Event::Written(buffer.resource, contents.len()));
    }

    fn create_target(&mut self, width: u32, height: u32) -> Result<MockHandle, ResourceError> {
        if self.shared.failures.borrow().targets {
            return Err(ResourceError::Target {
                width,
                height,
                reason: "out of memory".into(),
            });
        }
        Ok(self.allocate(Resource::Target { width, height }))
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.shared
            .events
            .borrow_mut()
            .push(Event::SurfaceResized(width, height));
    }

    fn submit(&mut self, frame: FrameCommands<'_, Self>) -> Result<(), ResourceError> {
        let passes: Vec<_> = frame.passes.iter().map(PassCommand::kind).collect();
        let mut record = SubmittedFrame {
            passes: passes.clone(),
            offscreen: frame.offscreen.is_some(),
            scene: frame.scene,
            post: frame.post,
            wireframe: None,
            composite_blurred: None,
            led_count: None,
        };
        for pass in &frame.passes {
            match pass {
                PassCommand::Mesh { wireframe, .. } => record.wireframe = Some(*wireframe),
                PassCommand::Leds { led_count, .. } => record.led_count = Some(*led_count),
                PassCommand::Composite { blurred, .. } => record.composite_blurred = Some(*blurred),
                _ => {}
            }
        }
        self.shared.events.borrow_mut().push(Event::Submitted(passes));
        *self.shared.last_frame.borrow_mut() = Some(record);
        Ok(())
    }

    fn take_failed_allocations(&mut self) -> Vec<Allocation> {
        std::mem::take(&mut *self.shared.late_failures.borrow_mut())
    }
}

impl Recorder {
    pub fn fail_program(&self, kind: ProgramKind) {
        self.shared.failures.borrow_mut().programs.insert(kind);
    }

    pub fn fail_buffers(&self, fail: bool) {
        self.shared.failures.borrow_mut().buffers = fail;
    }

    pub fn fail_targets(&self, fail: bool) {
        self.shared.failures.borrow_mut().targets = fail;
    }

    /// Reports `allocation` as invalid on the next drain, like an error scope
    /// that resolves after creation already succeeded.
    pub fn fail_later(&self, allocation: Allocation) {
        self.shared.late_failures.borrow_mut().push(allocation);
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.shared.events.borrow_mut().clear();
    }

    /// Handles created and not yet dropped.
    pub fn live_handles(&self) -> i64 {
        self.shared.live.get()
    }

    pub fn released_count(&self) -> usize {
        self.shared
            .events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Released(..)))
            .count()
    }

    pub fn submissions(&self) -> usize {
        self.shared
            .events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Submitted(_)))
            .count()
    }

    pub fn last_frame(&self) -> Option<SubmittedFrame> {
        self.shared.last_frame.borrow().clone()
    }

    /// Number of uploads (creations and in-place writes) that reached buffers of `role`.
    pub fn writes_to(&self, role: BufferRole) -> usize {
        self.shared
            .events
            .borrow()
            .iter()
            .filter(|e| match e {
                Event::Created(_, Resource::Buffer(r)) | Event::Written(Resource::Buffer(r), _) => *r == role,
                _ => false,
            })
            .count()
    }
}
