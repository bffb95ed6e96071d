use crate::config::GridResolution;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Uniform block shared by the init and react kernels.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SurfaceParameters {
    pub resolution: u32,
    pub step: f32,
    /// Seconds since the container last accelerated.
    pub elapsed_time: f32,
    pub delta_time: f32,
    pub water_position: [f32; 4],
    pub water_normal: [f32; 4],
    pub gravity: [f32; 4],
}

// Verify size for GPU alignment
const _: () = assert!(std::mem::size_of::<SurfaceParameters>() == 64);

impl SurfaceParameters {
    pub fn for_grid(resolution: GridResolution, step: f32) -> Self {
        Self {
            resolution: resolution.get(),
            step,
            elapsed_time: 0.0,
            delta_time: 0.0,
            water_position: [0.0; 4],
            water_normal: [0.0; 4],
            gravity: [0.0; 4],
        }
    }

    pub fn with_timing(mut self, elapsed_time: f32, delta_time: f32) -> Self {
        self.elapsed_time = elapsed_time;
        self.delta_time = delta_time;
        self
    }

    pub fn with_water(mut self, position: Vec3, normal: Vec3) -> Self {
        self.water_position = position.extend(0.0).to_array();
        self.water_normal = normal.extend(0.0).to_array();
        self
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity.extend(0.0).to_array();
        self
    }
}
