// SPDX-License-Identifier: GPL-3.0-only

//! GPU preview renderer
//!
//! Owns one texture and a textured-quad program. On each draw tick it
//! clears the target, pulls the newest frame from the hand-off queue and,
//! if one is present, uploads and draws it. Empty ticks leave the cleared
//! target alone. The renderer is driven by whoever owns the GPU surface; it
//! never blocks and never retries, and it holds no reference back into the
//! capture side.

use crate::backends::camera::types::{FrameFormat, PipelineFrame};
use crate::backends::camera::FrameQueue;
use crate::errors::RenderError;
use bytemuck::{Pod, Zeroable};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

/// Interleaved position + texcoord, one quad as a triangle strip
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Vertex {
    position: [f32; 2],
    tex_coord: [f32; 2],
}

const QUAD_VERTICES: [Vertex; 4] = [
    Vertex { position: [-1.0, -1.0], tex_coord: [0.0, 1.0] },
    Vertex { position: [1.0, -1.0], tex_coord: [1.0, 1.0] },
    Vertex { position: [-1.0, 1.0], tex_coord: [0.0, 0.0] },
    Vertex { position: [1.0, 1.0], tex_coord: [1.0, 0.0] },
];

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

/// Luma dimensions for the NV21 fragment path
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Nv21Params {
    width: u32,
    height: u32,
    _pad: [u32; 2],
}

/// GPU texture currently bound for frame uploads.
///
/// Reallocated only when the incoming frame's format or dimensions change.
struct FrameTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
    format: FrameFormat,
}

/// Textured-quad renderer for converted frames
pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,
    vertex_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    rgba_pipeline: wgpu::RenderPipeline,
    nv21_pipeline: wgpu::RenderPipeline,
    rgba_layout: wgpu::BindGroupLayout,
    nv21_layout: wgpu::BindGroupLayout,
    frame_texture: Option<FrameTexture>,
}

impl Renderer {
    /// Compile the quad program and prepare both upload paths.
    ///
    /// `target_format` is the format of the surface this renderer will be
    /// asked to draw into.
    pub fn new(target_format: wgpu::TextureFormat) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        info!(adapter = %adapter.get_info().name, "Initializing renderer");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Preview Renderer Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Textured Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("texture_quad.wgsl").into()),
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Frame Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let rgba_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("RGBA Frame Layout"),
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

        let nv21_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("NV21 Frame Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let rgba_pipeline = create_quad_pipeline(
            &device,
            &shader,
            &rgba_layout,
            "fs_rgba",
            target_format,
            "RGBA Quad Pipeline",
        );
        let nv21_pipeline = create_quad_pipeline(
            &device,
            &shader,
            &nv21_layout,
            "fs_nv21",
            target_format,
            "NV21 Quad Pipeline",
        );

        Ok(Self {
            device,
            queue,
            target_format,
            vertex_buffer,
            sampler,
            rgba_pipeline,
            nv21_pipeline,
            rgba_layout,
            nv21_layout,
            frame_texture: None,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// One cooperative draw tick.
    ///
    /// Clears the target, then uploads and draws the newest queued frame if
    /// one is pending; an empty queue makes the tick a no-op after the
    /// clear. Frames whose buffer length does not exactly match their
    /// declared dimensions are rejected and skipped.
    pub fn draw_tick(&mut self, target: &wgpu::TextureView, frame_queue: &FrameQueue) {
        let frame = frame_queue.poll_latest();

        if let Some(ref frame) = frame {
            let expected = frame.format.expected_len(frame.width, frame.height);
            if frame.data.len() != expected {
                warn!(
                    len = frame.data.len(),
                    expected,
                    width = frame.width,
                    height = frame.height,
                    "Rejecting frame upload with mismatched buffer length"
                );
                self.clear_only(target);
                return;
            }
            self.ensure_texture(frame);
            self.upload(frame);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Draw Tick Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Preview Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
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

            if let (Some(frame), Some(frame_texture)) = (&frame, &self.frame_texture) {
                let pipeline = match frame.format {
                    FrameFormat::Rgba => &self.rgba_pipeline,
                    FrameFormat::Nv21 => &self.nv21_pipeline,
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &frame_texture.bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.draw(0..4, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
    }

    fn clear_only(&self, target: &wgpu::TextureView) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
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
        self.queue.submit(Some(encoder.finish()));
    }

    /// (Re)allocate the frame texture and bind group when the incoming
    /// frame's shape changes
    fn ensure_texture(&mut self, frame: &PipelineFrame) {
        if let Some(existing) = &self.frame_texture {
            if existing.width == frame.width
                && existing.height == frame.height
                && existing.format == frame.format
            {
                return;
            }
        }

        debug!(
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Allocating frame texture"
        );

        let (tex_width, tex_height, tex_format) = match frame.format {
            // NV21 lives in a single R8 texture: h luma rows plus h/2
            // interleaved chroma rows
            FrameFormat::Nv21 => (frame.width, frame.height * 3 / 2, wgpu::TextureFormat::R8Unorm),
            FrameFormat::Rgba => (frame.width, frame.height, wgpu::TextureFormat::Rgba8Unorm),
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Texture"),
            size: wgpu::Extent3d {
                width: tex_width,
                height: tex_height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: tex_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = match frame.format {
            FrameFormat::Rgba => self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("RGBA Frame Bind Group"),
                layout: &self.rgba_layout,
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
            }),
            FrameFormat::Nv21 => {
                let params = Nv21Params {
                    width: frame.width,
                    height: frame.height,
                    _pad: [0; 2],
                };
                let uniform = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("NV21 Params"),
                        contents: bytemuck::bytes_of(&params),
                        usage: wgpu::BufferUsages::UNIFORM,
                    });
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("NV21 Frame Bind Group"),
                    layout: &self.nv21_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::TextureView(&view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: uniform.as_entire_binding(),
                        },
                    ],
                })
            }
        };

        self.frame_texture = Some(FrameTexture {
            texture,
            bind_group,
            width: frame.width,
            height: frame.height,
            format: frame.format,
        });
    }

    fn upload(&self, frame: &PipelineFrame) {
        let Some(frame_texture) = &self.frame_texture else {
            return;
        };

        let (bytes_per_row, rows) = match frame.format {
            FrameFormat::Nv21 => (frame.width, frame.height * 3 / 2),
            FrameFormat::Rgba => (frame.width * 4, frame.height),
        };

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &frame_texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: frame.width,
                height: rows,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Create an offscreen render target usable as a draw-tick destination
    pub fn create_offscreen_target(&self, width: u32, height: u32) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.target_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    /// Copy a rendered target back into host memory as tightly packed
    /// 4-byte pixels. Used by the headless demo and tests.
    pub fn read_back_rgba(
        &self,
        target: &wgpu::Texture,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let bytes_per_pixel = 4u32;
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        pollster::block_on(rx)
            .map_err(|e| RenderError::Readback(format!("map channel closed: {}", e)))?
            .map_err(|e| RenderError::Readback(e.to_string()))?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in 0..height {
            let start = (row * padded_bytes_per_row) as usize;
            pixels.extend_from_slice(&data[start..start + unpadded_bytes_per_row as usize]);
        }
        drop(data);
        staging.unmap();

        Ok(pixels)
    }
}

fn create_quad_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    bind_group_layout: &wgpu::BindGroupLayout,
    fragment_entry: &str,
    target_format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: fragment_entry,
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
