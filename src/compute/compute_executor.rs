use super::{buffer_manager::FieldBuffers, gpu_pipeline::KernelSet};
use crate::gpu::GpuContext;
use crate::stage::{DispatchSize, Kernel};

#[derive(Default)]
pub struct ComputeExecutor;

impl ComputeExecutor {
    /// Encodes and submits one dispatch without waiting for it.
    pub fn submit_dispatch(
        &self,
        gpu: &GpuContext,
        kernels: &KernelSet,
        buffers: &FieldBuffers,
        kernel: Kernel,
        size: DispatchSize,
    ) -> wgpu::SubmissionIndex {
        let mut encoder = self.create_command_encoder(gpu, kernel);
        self.dispatch_compute_pass(&mut encoder, kernels, buffers, kernel, size);
        gpu.queue.submit(Some(encoder.finish()))
    }

    pub fn wait_idle(&self, gpu: &GpuContext) {
        gpu.device.poll(wgpu::Maintain::Wait);
    }

    fn create_command_encoder(&self, gpu: &GpuContext, kernel: Kernel) -> wgpu::CommandEncoder {
        gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(match kernel {
                Kernel::Init => "Surface Init Encoder",
                Kernel::React => "Surface React Encoder",
            }),
        })
    }

    fn dispatch_compute_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        kernels: &KernelSet,
        buffers: &FieldBuffers,
        kernel: Kernel,
        size: DispatchSize,
    ) {
        let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(kernel.entry_point()),
            timestamp_writes: None,
        });

        compute_pass.set_pipeline(kernels.pipeline(kernel));
        compute_pass.set_bind_group(0, buffers.bind_group(), &[]);
        compute_pass.dispatch_workgroups(size.x, size.y, size.z);
    }
}
