//! Blends container acceleration and gravity into the surface normal fed to
//! the react kernel.

use crate::config::{SmoothingLaw, SurfaceConfig};
use crate::error::SurfaceResult;
use glam::Vec3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlendedForce {
    /// Instantaneous force for this frame.
    pub raw: Vec3,
    /// Surface normal after smoothing toward `raw`.
    pub smoothed: Vec3,
}

#[derive(Clone, Debug)]
pub struct ForceBlender {
    gravity: Vec3,
    density: f32,
    acceleration_correction: u32,
    smoothing: SmoothingLaw,
    normal: Vec3,
}

impl ForceBlender {
    /// Rejects a smoothing law whose blend factor would not stay finite.
    pub fn new(
        gravity: Vec3,
        density: f32,
        acceleration_correction: u32,
        smoothing: SmoothingLaw,
    ) -> SurfaceResult<Self> {
        smoothing.validate()?;
        Ok(Self {
            gravity,
            density,
            acceleration_correction,
            smoothing,
            normal: -gravity,
        })
    }

    pub fn from_config(config: &SurfaceConfig) -> SurfaceResult<Self> {
        Self::new(
            config.gravity_vector(),
            config.density,
            config.acceleration_correction,
            config.smoothing,
        )
    }

    /// Puts the normal back at rest, opposing gravity.
    pub fn reset(&mut self) {
        self.normal = -self.gravity;
    }

    pub fn raw_force(&self, acceleration: Vec3) -> Vec3 {
        let divisor = self.acceleration_correction.saturating_add(1) as f32;
        self.density * (acceleration / divisor - self.gravity)
    }

    /// Moves the normal toward this frame's raw force by the smoothing factor.
    pub fn blend(&mut self, acceleration: Vec3, dt: f32) -> BlendedForce {
        let raw = self.raw_force(acceleration);
        let t = self.smoothing.factor(dt);
        self.normal = self.normal.lerp(raw, t);
        BlendedForce {
            raw,
            smoothed: self.normal,
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }
}
