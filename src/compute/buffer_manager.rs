use crate::error::{SurfaceError, SurfaceResult};
use crate::gpu::GpuContext;
use wgpu::{BindGroup, BindGroupLayout, Buffer};

/// Bytes per surface point: three packed f32.
pub const POINT_SIZE: u64 = 12;

/// Position, velocity and relative-position buffers plus their bind group.
pub struct FieldBuffers {
    positions: Buffer,
    velocities: Buffer,
    relative_positions: Buffer,
    bind_group: BindGroup,
    capacity: u32,
}

impl FieldBuffers {
    pub fn positions(&self) -> &Buffer {
        &self.positions
    }

    pub fn velocities(&self) -> &Buffer {
        &self.velocities
    }

    pub fn relative_positions(&self) -> &Buffer {
        &self.relative_positions
    }

    pub fn bind_group(&self) -> &BindGroup {
        &self.bind_group
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub(crate) fn destroy(self) {
        self.positions.destroy();
        self.velocities.destroy();
        self.relative_positions.destroy();
    }
}

pub struct BufferManager;

impl BufferManager {
    pub fn create_params_buffer(gpu: &GpuContext) -> Buffer {
        gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Surface Params Buffer"),
            size: std::mem::size_of::<super::SurfaceParameters>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn create_field_buffers(
        gpu: &GpuContext,
        layout: &BindGroupLayout,
        params_buffer: &Buffer,
        capacity: u32,
    ) -> SurfaceResult<FieldBuffers> {
        let size = capacity as u64 * POINT_SIZE;
        let limit = gpu.max_storage_binding();
        if size > limit {
            return Err(SurfaceError::Gpu(format!(
                "field buffer of {} bytes exceeds storage binding limit {}",
                size, limit
            )));
        }

        let positions = Self::create_storage_buffer(gpu, "Positions Buffer", size);
        let velocities = Self::create_storage_buffer(gpu, "Velocities Buffer", size);
        let relative_positions =
            Self::create_storage_buffer(gpu, "Relative Positions Buffer", size);

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Surface Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: positions.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: velocities.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: relative_positions.as_entire_binding(),
                },
            ],
        });

        Ok(FieldBuffers {
            positions,
            velocities,
            relative_positions,
            bind_group,
            capacity,
        })
    }

    /// Copies the first `count` points of `source` back to the host.
    pub async fn read_points(
        gpu: &GpuContext,
        source: &Buffer,
        count: u32,
    ) -> SurfaceResult<Vec<[f32; 3]>> {
        let size = count as u64 * POINT_SIZE;
        if size > source.size() {
            return Err(SurfaceError::Gpu(format!(
                "read of {} bytes exceeds buffer size {}",
                size,
                source.size()
            )));
        }
        if size == 0 {
            return Ok(Vec::new());
        }

        let staging_buffer = Self::create_staging_buffer(gpu, size);
        Self::copy_to_staging_buffer(gpu, source, &staging_buffer);
        Self::read_from_staging_buffer(gpu, &staging_buffer).await
    }

    fn create_storage_buffer(gpu: &GpuContext, label: &str, size: u64) -> Buffer {
        gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_staging_buffer(gpu: &GpuContext, size: u64) -> Buffer {
        gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn copy_to_staging_buffer(gpu: &GpuContext, source: &Buffer, staging_buffer: &Buffer) {
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Copy Encoder"),
        });

        encoder.copy_buffer_to_buffer(source, 0, staging_buffer, 0, staging_buffer.size());

        gpu.queue.submit(Some(encoder.finish()));
    }

    async fn read_from_staging_buffer(
        gpu: &GpuContext,
        staging_buffer: &Buffer,
    ) -> SurfaceResult<Vec<[f32; 3]>> {
        let buffer_slice = staging_buffer.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();

        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        gpu.device.poll(wgpu::Maintain::Wait);
        rx.await
            .map_err(|_| SurfaceError::Gpu("map callback dropped".into()))?
            .map_err(|e| SurfaceError::Gpu(format!("buffer map failed: {}", e)))?;

        let data = buffer_slice.get_mapped_range();
        let points: Vec<[f32; 3]> = bytemuck::cast_slice(&data).to_vec();

        drop(data);
        staging_buffer.unmap();

        Ok(points)
    }
}
