//! Contracts for the two collaborators of the step driver: the compute stage
//! that owns the kernels and the renderer that draws the field.

use crate::compute::SurfaceParameters;
use crate::config::GridResolution;
use crate::error::SurfaceResult;
use glam::Vec3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kernel {
    Init,
    React,
}

impl Kernel {
    pub fn entry_point(self) -> &'static str {
        match self {
            Kernel::Init => "init_kernel",
            Kernel::React => "react_kernel",
        }
    }
}

/// Work-group counts of one dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DispatchSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl DispatchSize {
    /// `ceil(resolution / group_width)` groups on X and Y, one on Z.
    pub fn for_grid(resolution: GridResolution, group_width: u32) -> Self {
        let groups = resolution.get().div_ceil(group_width.max(1));
        Self {
            x: groups,
            y: groups,
            z: 1,
        }
    }

    pub fn group_count(&self) -> u32 {
        self.x * self.y * self.z
    }
}

/// Axis-aligned box handed to the renderer for culling and framing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl Bounds {
    /// Origin-centred cube of edge `2 + 2 / resolution`.
    pub fn for_grid(resolution: GridResolution) -> Self {
        let edge = 2.0 + 2.0 / resolution.get() as f32;
        Self {
            center: Vec3::ZERO,
            size: Vec3::splat(edge),
        }
    }

    pub fn half_extent(&self) -> Vec3 {
        self.size * 0.5
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InstancedDraw {
    pub instance_count: u32,
    pub step: f32,
    pub bounds: Bounds,
}

impl InstancedDraw {
    pub fn for_grid(resolution: GridResolution, step: f32) -> Self {
        Self {
            instance_count: resolution.point_count(),
            step,
            bounds: Bounds::for_grid(resolution),
        }
    }
}

/// GPU kernel stage. Submissions are fire-and-forget; `drain` is the only
/// synchronisation point.
pub trait ComputeStage {
    type Buffers;

    /// Creates the position, velocity and relative-position buffers together.
    fn allocate(&mut self, capacity: u32) -> SurfaceResult<Self::Buffers>;

    fn write_parameters(&mut self, parameters: &SurfaceParameters) -> SurfaceResult<()>;

    fn dispatch(
        &mut self,
        kernel: Kernel,
        buffers: &Self::Buffers,
        size: DispatchSize,
    ) -> SurfaceResult<()>;

    /// Blocks until all submitted work has completed.
    fn drain(&mut self) -> SurfaceResult<()>;

    fn release(&mut self, buffers: Self::Buffers);
}

/// Draw side. Receives the field buffers by shared reference only.
pub trait RenderStage<B> {
    fn draw(&mut self, buffers: &B, draw: &InstancedDraw) -> SurfaceResult<()>;
}
