//! Headless wgpu device shared by the compute and render stages.

use crate::error::{SurfaceError, SurfaceResult};
use anyhow::Result;
use wgpu::{util::DeviceExt, Buffer, BufferUsages};

pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("no GPU adapter available"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Surface Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let context = Self {
            instance,
            adapter,
            device,
            queue,
        };
        context.log_limits();
        Ok(context)
    }

    pub fn new_blocking() -> Result<Self> {
        pollster::block_on(Self::new())
    }

    /// Largest square work-group edge the device accepts.
    pub fn max_group_width(&self) -> u32 {
        let limits = self.device.limits();
        let by_invocations = (limits.max_compute_invocations_per_workgroup as f64).sqrt() as u32;
        limits
            .max_compute_workgroup_size_x
            .min(limits.max_compute_workgroup_size_y)
            .min(by_invocations)
    }

    pub fn max_groups_per_dimension(&self) -> u32 {
        self.device.limits().max_compute_workgroups_per_dimension
    }

    pub fn max_storage_binding(&self) -> u64 {
        self.device.limits().max_storage_buffer_binding_size as u64
    }

    pub fn check_group_width(&self, group_width: u32) -> SurfaceResult<()> {
        let max = self.max_group_width();
        if group_width == 0 || group_width > max {
            return Err(SurfaceError::Gpu(format!(
                "group width {} not supported by device (max {})",
                group_width, max
            )));
        }
        Ok(())
    }

    pub fn create_buffer_init(&self, label: &str, data: &[u8], usage: BufferUsages) -> Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: data,
            usage,
        })
    }

    fn log_limits(&self) {
        let info = self.adapter.get_info();
        log::info!("Using adapter: {} ({:?})", info.name, info.backend);
        log::info!(
            "Compute limits: group width <= {}, {} groups per dimension, {} byte storage bindings",
            self.max_group_width(),
            self.max_groups_per_dimension(),
            self.max_storage_binding()
        );
    }
}
