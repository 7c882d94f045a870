//! wgpu adapter for the [`GraphicsBackend`] trait.
//!
//! One WGSL shader covers every draw call: positions are pre-transformed
//! CPU-side where needed, the camera matrix is the only uniform, and
//! untextured draws sample the built-in 1×1 white texture. The three
//! vertex streams of a buffer-set map to three vertex buffer slots (the
//! batch keeps them as parallel arrays, so no interleaving pass is needed
//! before upload); the static quad index pattern uploads once at
//! registration.
//!
//! Blend mode and primitive topology are baked into wgpu pipelines, so the
//! adapter pre-builds one pipeline per (blend, topology) pair and picks at
//! submit time. Each `submit` records one render pass against the frame's
//! target view; the first pass after [`begin_frame`](WgpuBackend::begin_frame)
//! clears, later ones load.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::batch::DrawMode;

use super::{
    BlendMode, BufferSetId, DrawSubmission, GraphicsBackend, ScissorRect, TextureId, VertexSlice,
};

/// Camera view-projection matrix uploaded as a uniform buffer.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

const POSITION_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    }],
};

const TEXCOORD_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 8,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x2,
    }],
};

const COLOR_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 4,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 2,
        format: wgpu::VertexFormat::Unorm8x4,
    }],
};

struct GpuBufferSet {
    positions: wgpu::Buffer,
    texcoords: wgpu::Buffer,
    colors: wgpu::Buffer,
    indices: wgpu::Buffer,
}

struct FrameTarget {
    view: wgpu::TextureView,
    clear: Option<wgpu::Color>,
    cleared: bool,
}

/// A [`GraphicsBackend`] over a wgpu device and queue.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    // [blend][topology: 0 = triangles, 1 = lines]
    pipelines: [[wgpu::RenderPipeline; 2]; 3],
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: HashMap<TextureId, wgpu::BindGroup>,
    next_texture_id: u32,
    buffer_sets: Vec<Option<GpuBufferSet>>,
    blend_mode: BlendMode,
    scissor: Option<ScissorRect>,
    viewport: Option<(i32, i32, u32, u32)>,
    frame: Option<FrameTarget>,
}

impl WgpuBackend {
    /// Build an adapter over an existing device and queue, targeting views
    /// of `target_format`.
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("batch shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("batch.wgsl").into()),
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("batch camera layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("batch texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("batch pipeline layout"),
            bind_group_layouts: &[&camera_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let blends = [BlendMode::Alpha, BlendMode::Additive, BlendMode::Multiplied];
        let pipelines = blends.map(|blend| {
            [
                wgpu::PrimitiveTopology::TriangleList,
                wgpu::PrimitiveTopology::LineList,
            ]
            .map(|topology| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("batch pipeline"),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        buffers: &[POSITION_LAYOUT, TEXCOORD_LAYOUT, COLOR_LAYOUT],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: target_format,
                            blend: Some(blend_state(blend)),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: None,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            })
        });

        let camera_uniform = CameraUniform {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("batch camera buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("batch camera bind group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("batch sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mut backend = Self {
            device,
            queue,
            pipelines,
            camera_buffer,
            camera_bind_group,
            texture_layout,
            sampler,
            textures: HashMap::new(),
            next_texture_id: 1,
            buffer_sets: Vec::new(),
            blend_mode: BlendMode::Alpha,
            scissor: None,
            viewport: None,
            frame: None,
        };

        // The white fallback texture lives at the reserved default id.
        let white = backend.upload_texture_rgba8(1, 1, &[255, 255, 255, 255]);
        backend.textures.insert(TextureId::DEFAULT, white);
        backend
    }

    /// Create a device with no surface attached and build an adapter over
    /// it. Draws target offscreen views (see
    /// [`create_offscreen_target`](Self::create_offscreen_target)).
    pub fn new_headless() -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .expect("Failed to find a suitable GPU adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("eldr device".into()),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .expect("Failed to create GPU device");

        Self::from_device(device, queue, wgpu::TextureFormat::Rgba8UnormSrgb)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Point subsequent submits at `view`. With `clear` set, the first
    /// pass of the frame clears to that color.
    pub fn begin_frame(&mut self, view: wgpu::TextureView, clear: Option<wgpu::Color>) {
        self.frame = Some(FrameTarget {
            view,
            clear,
            cleared: false,
        });
    }

    /// Drop the frame target. Presentation of surface textures stays with
    /// the caller.
    pub fn end_frame(&mut self) {
        self.frame = None;
    }

    /// Create a render-target texture for windowless use.
    pub fn create_offscreen_target(&self, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Upload caller-provided RGBA8 pixels and mint a texture id for them.
    /// Decoding stays outside the engine; this is the handoff point.
    pub fn create_texture_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]) -> TextureId {
        let bind_group = self.upload_texture_rgba8(width, height, pixels);
        let id = TextureId(self.next_texture_id);
        self.next_texture_id += 1;
        self.textures.insert(id, bind_group);
        log::debug!("loaded texture {}x{} as id {}", width, height, id.0);
        id
    }

    /// Release a texture created with
    /// [`create_texture_rgba8`](Self::create_texture_rgba8).
    pub fn unload_texture(&mut self, id: TextureId) {
        if id == TextureId::DEFAULT {
            log::warn!("refusing to unload the white fallback texture");
            return;
        }
        self.textures.remove(&id);
    }

    fn upload_texture_rgba8(&self, width: u32, height: u32, pixels: &[u8]) -> wgpu::BindGroup {
        assert_eq!(pixels.len() as u32, width * height * 4, "pixel data size mismatch");

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("batch texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("batch texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

fn pipeline_for(
    pipelines: &[[wgpu::RenderPipeline; 2]; 3],
    blend: BlendMode,
    mode: DrawMode,
) -> &wgpu::RenderPipeline {
    let blend = match blend {
        BlendMode::Alpha => 0,
        BlendMode::Additive => 1,
        BlendMode::Multiplied => 2,
    };
    let topology = match mode {
        DrawMode::Triangles | DrawMode::Quads => 0,
        DrawMode::Lines => 1,
    };
    &pipelines[blend][topology]
}

impl GraphicsBackend for WgpuBackend {
    fn load_buffer_set(&mut self, vertex_capacity: usize, indices: &[u32]) -> BufferSetId {
        let vertex_buffer = |label, size| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let set = GpuBufferSet {
            positions: vertex_buffer("batch positions", vertex_capacity * 12),
            texcoords: vertex_buffer("batch texcoords", vertex_capacity * 8),
            colors: vertex_buffer("batch colors", vertex_capacity * 4),
            indices: self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("batch indices"),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
        };
        self.buffer_sets.push(Some(set));
        BufferSetId(self.buffer_sets.len() - 1)
    }

    fn unload_buffer_set(&mut self, set: BufferSetId) {
        // Slot ids stay stable; the buffers drop here.
        self.buffer_sets[set.0] = None;
    }

    fn upload(&mut self, set: BufferSetId, data: VertexSlice<'_>) {
        let Some(buffers) = &self.buffer_sets[set.0] else {
            log::warn!("upload to unloaded buffer-set {}", set.0);
            return;
        };
        self.queue
            .write_buffer(&buffers.positions, 0, bytemuck::cast_slice(data.positions));
        self.queue
            .write_buffer(&buffers.texcoords, 0, bytemuck::cast_slice(data.texcoords));
        self.queue
            .write_buffer(&buffers.colors, 0, bytemuck::cast_slice(data.colors));
    }

    fn submit(&mut self, set: BufferSetId, mvp: Mat4, calls: &[DrawSubmission]) {
        let Self {
            device,
            queue,
            pipelines,
            camera_buffer,
            camera_bind_group,
            textures,
            buffer_sets,
            blend_mode,
            scissor,
            viewport,
            frame,
            ..
        } = self;

        let Some(buffers) = &buffer_sets[set.0] else {
            log::warn!("submit against unloaded buffer-set {}", set.0);
            return;
        };
        let Some(frame) = frame.as_mut() else {
            log::warn!("submit with no frame target; call begin_frame first");
            return;
        };
        if calls.is_empty() && frame.cleared {
            return;
        }

        let camera_uniform = CameraUniform {
            view_proj: mvp.to_cols_array_2d(),
        };
        queue.write_buffer(camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("batch flush encoder"),
        });

        {
            let load = match frame.clear {
                Some(color) if !frame.cleared => wgpu::LoadOp::Clear(color),
                _ => wgpu::LoadOp::Load,
            };
            frame.cleared = true;

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("batch flush pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some((x, y, w, h)) = *viewport {
                pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
            }
            if let Some(scissor) = *scissor {
                pass.set_scissor_rect(scissor.x as u32, scissor.y as u32, scissor.width, scissor.height);
            }

            pass.set_bind_group(0, &*camera_bind_group, &[]);
            pass.set_vertex_buffer(0, buffers.positions.slice(..));
            pass.set_vertex_buffer(1, buffers.texcoords.slice(..));
            pass.set_vertex_buffer(2, buffers.colors.slice(..));
            pass.set_index_buffer(buffers.indices.slice(..), wgpu::IndexFormat::Uint32);

            for call in calls {
                let texture = textures
                    .get(&call.texture)
                    .unwrap_or_else(|| &textures[&TextureId::DEFAULT]);
                pass.set_pipeline(pipeline_for(pipelines, *blend_mode, call.mode));
                pass.set_bind_group(1, texture, &[]);

                match call.mode {
                    DrawMode::Quads => {
                        // The static index pattern covers six indices per
                        // four vertices; the offset is alignment-corrected
                        // to a multiple of four by the flush engine.
                        let first_index = call.vertex_offset / 4 * 6;
                        let index_count = call.vertex_count / 4 * 6;
                        pass.draw_indexed(first_index..first_index + index_count, 0, 0..1);
                    }
                    DrawMode::Lines | DrawMode::Triangles => {
                        pass.draw(call.vertex_offset..call.vertex_offset + call.vertex_count, 0..1);
                    }
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    fn set_scissor(&mut self, rect: Option<ScissorRect>) {
        self.scissor = rect;
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Some((x, y, width, height));
    }

    fn white_texture(&self) -> TextureId {
        TextureId::DEFAULT
    }
}

/// Map the GL-style blend modes onto wgpu blend states.
fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        BlendMode::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
        BlendMode::Multiplied => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Dst,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Dst,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        },
    }
}
