//! wgpu implementation of the kernel stage.

mod buffer_manager;
mod compute_executor;
mod gpu_pipeline;
mod surface_parameters;

pub use buffer_manager::{FieldBuffers, POINT_SIZE};
pub use gpu_pipeline::KernelSet;
pub use surface_parameters::SurfaceParameters;

use self::{buffer_manager::BufferManager, compute_executor::ComputeExecutor};
use crate::error::{SurfaceError, SurfaceResult};
use crate::gpu::GpuContext;
use crate::stage::{ComputeStage, DispatchSize, Kernel};
use std::sync::Arc;
use wgpu::Buffer;

pub struct GpuComputeStage {
    gpu: Arc<GpuContext>,
    kernels: KernelSet,
    params_buffer: Buffer,
    executor: ComputeExecutor,
    group_width: u32,
    max_groups: u32,
    pending: usize,
}

impl GpuComputeStage {
    pub fn new(gpu: Arc<GpuContext>, group_width: u32) -> SurfaceResult<Self> {
        gpu.check_group_width(group_width)?;

        let kernels = KernelSet::new(&gpu, group_width);
        let params_buffer = BufferManager::create_params_buffer(&gpu);

        Ok(Self {
            max_groups: gpu.max_groups_per_dimension(),
            gpu,
            kernels,
            params_buffer,
            executor: ComputeExecutor::default(),
            group_width,
            pending: 0,
        })
    }

    pub fn gpu(&self) -> &Arc<GpuContext> {
        &self.gpu
    }

    pub fn group_width(&self) -> u32 {
        self.group_width
    }

    /// Dispatches submitted since the last drain.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn read_positions(
        &self,
        buffers: &FieldBuffers,
        count: u32,
    ) -> SurfaceResult<Vec<[f32; 3]>> {
        self.read_points(buffers.positions(), count)
    }

    pub fn read_velocities(
        &self,
        buffers: &FieldBuffers,
        count: u32,
    ) -> SurfaceResult<Vec<[f32; 3]>> {
        self.read_points(buffers.velocities(), count)
    }

    pub fn read_relative_positions(
        &self,
        buffers: &FieldBuffers,
        count: u32,
    ) -> SurfaceResult<Vec<[f32; 3]>> {
        self.read_points(buffers.relative_positions(), count)
    }

    fn read_points(&self, source: &Buffer, count: u32) -> SurfaceResult<Vec<[f32; 3]>> {
        pollster::block_on(BufferManager::read_points(&self.gpu, source, count))
    }
}

impl ComputeStage for GpuComputeStage {
    type Buffers = FieldBuffers;

    fn allocate(&mut self, capacity: u32) -> SurfaceResult<FieldBuffers> {
        BufferManager::create_field_buffers(
            &self.gpu,
            self.kernels.bind_group_layout(),
            &self.params_buffer,
            capacity,
        )
    }

    fn write_parameters(&mut self, parameters: &SurfaceParameters) -> SurfaceResult<()> {
        self.gpu
            .queue
            .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[*parameters]));
        Ok(())
    }

    fn dispatch(
        &mut self,
        kernel: Kernel,
        buffers: &FieldBuffers,
        size: DispatchSize,
    ) -> SurfaceResult<()> {
        if size.x > self.max_groups || size.y > self.max_groups || size.z > self.max_groups {
            return Err(SurfaceError::Gpu(format!(
                "dispatch {:?} exceeds {} groups per dimension",
                size, self.max_groups
            )));
        }
        self.executor
            .submit_dispatch(&self.gpu, &self.kernels, buffers, kernel, size);
        self.pending += 1;
        Ok(())
    }

    fn drain(&mut self) -> SurfaceResult<()> {
        self.executor.wait_idle(&self.gpu);
        self.pending = 0;
        Ok(())
    }

    fn release(&mut self, buffers: FieldBuffers) {
        buffers.destroy();
    }
}
