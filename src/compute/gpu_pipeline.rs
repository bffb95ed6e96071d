use crate::gpu::GpuContext;
use crate::stage::Kernel;
use wgpu::{BindGroupLayout, ComputePipeline};

const SURFACE_SHADER_SOURCE: &str = include_str!("../shaders/surface.wgsl");
const GROUP_WIDTH_TOKEN: &str = "GROUP_WIDTH";

/// Init and react pipelines resolved once per stage instance.
pub struct KernelSet {
    bind_group_layout: BindGroupLayout,
    init_pipeline: ComputePipeline,
    react_pipeline: ComputePipeline,
}

impl KernelSet {
    pub fn new(gpu: &GpuContext, group_width: u32) -> Self {
        let shader = Self::load_shader(gpu, group_width);
        let bind_group_layout = Self::create_bind_group_layout(gpu);
        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Surface Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let init_pipeline =
            Self::create_compute_pipeline(gpu, &shader, &pipeline_layout, Kernel::Init);
        let react_pipeline =
            Self::create_compute_pipeline(gpu, &shader, &pipeline_layout, Kernel::React);

        Self {
            bind_group_layout,
            init_pipeline,
            react_pipeline,
        }
    }

    pub fn bind_group_layout(&self) -> &BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn pipeline(&self, kernel: Kernel) -> &ComputePipeline {
        match kernel {
            Kernel::Init => &self.init_pipeline,
            Kernel::React => &self.react_pipeline,
        }
    }

    pub fn shader_source(group_width: u32) -> String {
        SURFACE_SHADER_SOURCE.replace(GROUP_WIDTH_TOKEN, &format!("{}u", group_width))
    }

    fn load_shader(gpu: &GpuContext, group_width: u32) -> wgpu::ShaderModule {
        gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Surface Shader"),
            source: wgpu::ShaderSource::Wgsl(Self::shader_source(group_width).into()),
        })
    }

    fn create_bind_group_layout(gpu: &GpuContext) -> BindGroupLayout {
        gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Surface Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                Self::storage_entry(1),
                Self::storage_entry(2),
                Self::storage_entry(3),
            ],
        })
    }

    fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    fn create_compute_pipeline(
        gpu: &GpuContext,
        shader: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        kernel: Kernel,
    ) -> ComputePipeline {
        gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(kernel.entry_point()),
            layout: Some(layout),
            module: shader,
            entry_point: Some(kernel.entry_point()),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        })
    }
}
