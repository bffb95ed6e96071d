//! Offscreen renderer for the surface field.
//!
//! One instanced draw per frame: a unit cube scaled by the grid step,
//! instanced `resolution²` times and positioned from the shared positions
//! buffer, which is bound read-only. The draw bounds frame the camera.

pub mod camera;
pub mod capture;

use crate::compute::FieldBuffers;
use crate::error::{SurfaceError, SurfaceResult};
use crate::gpu::GpuContext;
use crate::stage::{InstancedDraw, RenderStage};
use camera::Camera;
use glam::Mat4;
use std::path::Path;
use std::sync::Arc;
use wgpu::util::DeviceExt;

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.2,
    b: 0.3,
    a: 1.0,
};
/// 6 faces x 2 triangles x 3 vertices
const CUBE_VERTEX_COUNT: u32 = 36;
/// 3 position + 3 normal floats
const FLOATS_PER_VERTEX: usize = 6;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    step: [f32; 4],
}

pub struct SurfaceRenderer {
    gpu: Arc<GpuContext>,
    width: u32,
    height: u32,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    cube_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    camera: Camera,
    model: Mat4,
    draws: u64,
    last_draw: Option<InstancedDraw>,
}

impl SurfaceRenderer {
    pub fn new(gpu: Arc<GpuContext>, width: u32, height: u32) -> SurfaceResult<Self> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidConfig(format!(
                "render target {}x{} has no area",
                width, height
            )));
        }

        let shader = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Instanced Surface Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/instanced.wgsl").into()),
        });

        let bind_group_layout = Self::create_bind_group_layout(&gpu);
        let pipeline = Self::create_render_pipeline(&gpu, &shader, &bind_group_layout);

        let cube_buffer = gpu.create_buffer_init(
            "Cube Vertex Buffer",
            bytemuck::cast_slice(&cube_vertices()),
            wgpu::BufferUsages::VERTEX,
        );

        let camera = Camera::new(width as f32 / height as f32);
        let uniform_buffer = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Draw Uniform Buffer"),
            contents: bytemuck::cast_slice(&[DrawUniform {
                view_proj: camera.view_projection_matrix(),
                model: Mat4::IDENTITY.to_cols_array_2d(),
                step: [0.0; 4],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let target = Self::create_texture(
            &gpu,
            "Surface Target",
            (width, height),
            TARGET_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = Self::create_texture(
            &gpu,
            "Surface Depth",
            (width, height),
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            gpu,
            width,
            height,
            pipeline,
            bind_group_layout,
            cube_buffer,
            uniform_buffer,
            target,
            target_view,
            depth_view,
            camera,
            model: Mat4::IDENTITY,
            draws: 0,
            last_draw: None,
        })
    }

    /// World transform of the container, applied to every instance.
    pub fn set_container_transform(&mut self, model: Mat4) {
        self.model = model;
    }

    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn last_draw(&self) -> Option<&InstancedDraw> {
        self.last_draw.as_ref()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Copies the last rendered frame back as tight RGBA rows.
    pub fn capture_frame(&self) -> SurfaceResult<Vec<u8>> {
        let padded_row = capture::padded_bytes_per_row(self.width);
        let staging_buffer = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Staging Buffer"),
            size: padded_row as u64 * self.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Encoder"),
        });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        self.gpu.queue.submit(Some(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.gpu.device.poll(wgpu::Maintain::Wait);
        pollster::block_on(rx)
            .map_err(|_| SurfaceError::Gpu("map callback dropped".into()))?
            .map_err(|e| SurfaceError::Gpu(format!("capture map failed: {}", e)))?;

        let data = buffer_slice.get_mapped_range();
        let frame = capture::strip_row_padding(&data, self.width, self.height, padded_row);

        drop(data);
        staging_buffer.unmap();

        Ok(frame)
    }

    pub fn save_frame<P: AsRef<Path>>(&self, path: P) -> SurfaceResult<()> {
        let frame = self.capture_frame()?;
        capture::save_png(path.as_ref(), &frame, self.width, self.height)?;
        log::info!("Frame saved to {}", path.as_ref().display());
        Ok(())
    }

    fn write_uniforms(&self, draw: &InstancedDraw) {
        let uniform = DrawUniform {
            view_proj: self.camera.view_projection_matrix(),
            model: self.model.to_cols_array_2d(),
            step: [draw.step, 0.0, 0.0, 0.0],
        };
        self.gpu
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    fn create_bind_group(&self, buffers: &FieldBuffers) -> wgpu::BindGroup {
        self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Instanced Draw Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.positions().as_entire_binding(),
                },
            ],
        })
    }

    fn create_texture(
        gpu: &GpuContext,
        label: &str,
        (width, height): (u32, u32),
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> wgpu::Texture {
        gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    }

    fn create_bind_group_layout(gpu: &GpuContext) -> wgpu::BindGroupLayout {
        gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Instanced Draw Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        })
    }

    fn create_render_pipeline(
        gpu: &GpuContext,
        shader: &wgpu::ShaderModule,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Instanced Draw Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        gpu.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Instanced Draw Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[Self::vertex_buffer_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: (FLOATS_PER_VERTEX * 4) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 3 * 4,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

impl RenderStage<FieldBuffers> for SurfaceRenderer {
    fn draw(&mut self, buffers: &FieldBuffers, draw: &InstancedDraw) -> SurfaceResult<()> {
        if draw.instance_count > buffers.capacity() {
            return Err(SurfaceError::Gpu(format!(
                "{} instances exceed field capacity {}",
                draw.instance_count,
                buffers.capacity()
            )));
        }

        self.camera.frame_bounds(&draw.bounds);
        self.write_uniforms(draw);
        let bind_group = self.create_bind_group(buffers);

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Surface Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Surface Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.cube_buffer.slice(..));
            render_pass.draw(0..CUBE_VERTEX_COUNT, 0..draw.instance_count);
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        self.draws += 1;
        self.last_draw = Some(*draw);
        Ok(())
    }
}

/// Unit cube centred on the origin, as a flat triangle list with face normals.
fn cube_vertices() -> Vec<f32> {
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        // normal, u axis, v axis
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    const CORNERS: [(f32, f32); 6] = [
        (-0.5, -0.5),
        (0.5, -0.5),
        (0.5, 0.5),
        (-0.5, -0.5),
        (0.5, 0.5),
        (-0.5, 0.5),
    ];

    let mut vertices = Vec::with_capacity(CUBE_VERTEX_COUNT as usize * FLOATS_PER_VERTEX);
    for (normal, u, v) in FACES {
        for (su, sv) in CORNERS {
            for axis in 0..3 {
                vertices.push(normal[axis] * 0.5 + u[axis] * su + v[axis] * sv);
            }
            vertices.extend_from_slice(&normal);
        }
    }
    vertices
}
