use super::backend::{
    Allocation, BufferRole, FrameCommands, GraphicsBackend, PassCommand, PostUniforms, ProgramKind,
    SceneUniforms,
};
use super::context::{GpuContext, DEPTH_FORMAT};
use super::mesh::Vertex;
use super::shaders;
use crate::error::ResourceError;
#[cfg(target_arch = "wasm32")]
use std::{cell::RefCell, rc::Rc};
use wgpu::util::DeviceExt;

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

const LED_BUFFERS: [wgpu::VertexBufferLayout<'static>; 2] = [
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    },
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[u8; 4]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Unorm8x4,
        }],
    },
];

const QUAD_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x2,
    }],
};

pub struct WgpuProgram {
    pipeline: wgpu::RenderPipeline,
    /// Line-list variant, only built for the mesh program.
    line_pipeline: Option<wgpu::RenderPipeline>,
}

/// Off-screen scene colour and depth plus the blur layer and the bind groups reading them.
pub struct WgpuTarget {
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    blur_view: wgpu::TextureView,
    blur_bind_group: wgpu::BindGroup,
    composite_bind_group: wgpu::BindGroup,
}

pub struct WgpuBackend {
    context: GpuContext,
    scene_buffer: wgpu::Buffer,
    post_buffer: wgpu::Buffer,
    scene_layout: wgpu::BindGroupLayout,
    blur_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    scene_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    /// Allocations whose error scope resolved with an error after creation returned.
    #[cfg(target_arch = "wasm32")]
    late_failures: Rc<RefCell<Vec<Allocation>>>,
}

impl WgpuBackend {
    pub fn new(context: GpuContext) -> Self {
        let device = &context.device;

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let post_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Post Uniforms"),
            size: std::mem::size_of::<PostUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let blur_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blur Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1),
                sampler_entry(2),
            ],
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1),
                texture_entry(2),
                sampler_entry(3),
            ],
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            context,
            scene_buffer,
            post_buffer,
            scene_layout,
            blur_layout,
            composite_layout,
            scene_bind_group,
            sampler,
            #[cfg(target_arch = "wasm32")]
            late_failures: Rc::default(),
        }
    }

    /// Pops the scope pushed for `allocation`. Native devices validate
    /// synchronously, so blocking here returns at once.
    #[cfg(not(target_arch = "wasm32"))]
    fn finish_scope(&self, _allocation: Allocation) -> Option<wgpu::Error> {
        pollster::block_on(self.context.device.pop_error_scope())
    }

    /// The browser resolves scopes on a later task. The allocation is handed
    /// out now and a failure is reported through `take_failed_allocations`.
    #[cfg(target_arch = "wasm32")]
    fn finish_scope(&self, allocation: Allocation) -> Option<wgpu::Error> {
        let scope = self.context.device.pop_error_scope();
        let failures = Rc::clone(&self.late_failures);
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(err) = scope.await {
                log::warn!("Creating {} failed: {err}", allocation.label());
                failures.borrow_mut().push(allocation);
            }
        });
        None
    }

    fn build_pipeline(
        &self,
        kind: ProgramKind,
        topology: wgpu::PrimitiveTopology,
        fragment_entry: &str,
    ) -> wgpu::RenderPipeline {
        let device = &self.context.device;
        let format = self.context.format();

        let (source, layout, vertex_entry, buffers, blend, depth): (
            String,
            &wgpu::BindGroupLayout,
            &str,
            &[wgpu::VertexBufferLayout<'static>],
            Option<wgpu::BlendState>,
            Option<wgpu::DepthStencilState>,
        ) = match kind {
            ProgramKind::Mesh => (
                shaders::scene_module(shaders::MESH_SHADER),
                &self.scene_layout,
                "vs_main",
                std::slice::from_ref(&Vertex::LAYOUT),
                Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                Some(depth_state(true, wgpu::CompareFunction::Less)),
            ),
            ProgramKind::Led | ProgramKind::Glow => (
                shaders::scene_module(shaders::LED_SHADER),
                &self.scene_layout,
                if kind == ProgramKind::Led { "vs_led" } else { "vs_glow" },
                &LED_BUFFERS,
                Some(ADDITIVE),
                Some(depth_state(false, wgpu::CompareFunction::Always)),
            ),
            ProgramKind::Blur => (
                shaders::post_module(shaders::BLUR_SHADER),
                &self.blur_layout,
                "vs_quad",
                std::slice::from_ref(&QUAD_LAYOUT),
                None,
                None,
            ),
            ProgramKind::Composite => (
                shaders::composite_module(),
                &self.composite_layout,
                "vs_quad",
                std::slice::from_ref(&QUAD_LAYOUT),
                None,
                None,
            ),
        };

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(kind.label()),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(kind.label()),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(kind.label()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(vertex_entry),
                buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(fragment_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: depth,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_color_texture(&self, width: u32, height: u32, label: &str) -> wgpu::TextureView {
        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.context.format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

impl GraphicsBackend for WgpuBackend {
    type Program = WgpuProgram;
    type Buffer = wgpu::Buffer;
    type Target = WgpuTarget;

    fn create_program(&mut self, kind: ProgramKind) -> Result<WgpuProgram, ResourceError> {
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let program = match kind {
            ProgramKind::Mesh => WgpuProgram {
                pipeline: self.build_pipeline(kind, wgpu::PrimitiveTopology::TriangleList, "fs_faces"),
                line_pipeline: Some(self.build_pipeline(kind, wgpu::PrimitiveTopology::LineList, "fs_wire")),
            },
            ProgramKind::Led => WgpuProgram {
                pipeline: self.build_pipeline(kind, wgpu::PrimitiveTopology::TriangleList, "fs_led"),
                line_pipeline: None,
            },
            ProgramKind::Glow => WgpuProgram {
                pipeline: self.build_pipeline(kind, wgpu::PrimitiveTopology::TriangleList, "fs_glow"),
                line_pipeline: None,
            },
            ProgramKind::Blur => WgpuProgram {
                pipeline: self.build_pipeline(kind, wgpu::PrimitiveTopology::TriangleStrip, "fs_blur"),
                line_pipeline: None,
            },
            ProgramKind::Composite => WgpuProgram {
                pipeline: self.build_pipeline(kind, wgpu::PrimitiveTopology::TriangleStrip, "fs_composite"),
                line_pipeline: None,
            },
        };

        match self.finish_scope(Allocation::Program(kind)) {
            Some(err) => Err(ResourceError::Program(kind.label(), err.to_string())),
            None => {
                log::debug!("Built {} program", kind.label());
                Ok(program)
            }
        }
    }

    fn create_buffer(&mut self, role: BufferRole, contents: &[u8]) -> Result<wgpu::Buffer, ResourceError> {
        let usage = if role.is_index() {
            wgpu::BufferUsages::INDEX
        } else {
            wgpu::BufferUsages::VERTEX
        };

        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(role.label()),
            contents,
            usage: usage | wgpu::BufferUsages::COPY_DST,
        });

        match self.finish_scope(Allocation::Buffer(role)) {
            Some(err) => Err(ResourceError::Buffer(role.label(), err.to_string())),
            None => Ok(buffer),
        }
    }

    fn write_buffer(&mut self, buffer: &wgpu::Buffer, contents: &[u8]) {
        self.context.queue.write_buffer(buffer, 0, contents);
    }

    fn create_target(&mut self, width: u32, height: u32) -> Result<WgpuTarget, ResourceError> {
        self.context
            .device
            .push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let color_view = self.create_color_texture(width, height, "Scene Color");
        let blur_view = self.create_color_texture(width, height, "Blur Color");
        let depth_view = super::context::create_depth_view(&self.context.device, width, height);

        let device = &self.context.device;
        let blur_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blur Bind Group"),
            layout: &self.blur_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.post_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: &self.composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.post_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&blur_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        match self.finish_scope(Allocation::Target) {
            Some(err) => Err(ResourceError::Target {
                width,
                height,
                reason: err.to_string(),
            }),
            None => Ok(WgpuTarget {
                color_view,
                depth_view,
                blur_view,
                blur_bind_group,
                composite_bind_group,
            }),
        }
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    fn submit(&mut self, frame: FrameCommands<'_, Self>) -> Result<(), ResourceError> {
        let output = match self.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return Err(ResourceError::Surface("surface lost, reconfigured".into()));
            }
            Err(err) => return Err(ResourceError::Surface(err.to_string())),
        };
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let queue = &self.context.queue;
        queue.write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&frame.scene));
        queue.write_buffer(&self.post_buffer, 0, bytemuck::bytes_of(&frame.post));

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let (scene_color, scene_depth) = match frame.offscreen {
            Some(target) => (&target.color_view, &target.depth_view),
            None => (&surface_view, &self.context.depth_view),
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: scene_color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: scene_depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.scene_bind_group, &[]);

            for command in &frame.passes {
                match command {
                    PassCommand::Mesh {
                        program,
                        vertices,
                        indices,
                        index_count,
                        wireframe,
                    } => {
                        let pipeline = if *wireframe {
                            match &program.line_pipeline {
                                Some(pipeline) => pipeline,
                                None => continue,
                            }
                        } else {
                            &program.pipeline
                        };
                        pass.set_pipeline(pipeline);
                        pass.set_vertex_buffer(0, vertices.slice(..));
                        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(0..*index_count, 0, 0..1);
                    }
                    PassCommand::Glow {
                        program,
                        positions,
                        colors,
                        led_count,
                    }
                    | PassCommand::Leds {
                        program,
                        positions,
                        colors,
                        led_count,
                    } => {
                        pass.set_pipeline(&program.pipeline);
                        pass.set_vertex_buffer(0, positions.slice(..));
                        pass.set_vertex_buffer(1, colors.slice(..));
                        pass.draw(0..6, 0..*led_count);
                    }
                    PassCommand::Blur { .. } | PassCommand::Composite { .. } => {}
                }
            }
        }

        for command in &frame.passes {
            let (label, view, program, bind_group, quad) = match command {
                PassCommand::Blur {
                    program,
                    target,
                    quad,
                } => ("Blur Pass", &target.blur_view, *program, &target.blur_bind_group, *quad),
                PassCommand::Composite {
                    program,
                    target,
                    quad,
                    ..
                } => (
                    "Composite Pass",
                    &surface_view,
                    *program,
                    &target.composite_bind_group,
                    *quad,
                ),
                _ => continue,
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&program.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.set_vertex_buffer(0, quad.slice(..));
            pass.draw(0..4, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn take_failed_allocations(&mut self) -> Vec<Allocation> {
        std::mem::take(&mut *self.late_failures.borrow_mut())
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}
