//! Adjustable parameters of the reactive surface.
//!
//! Defaults mirror the scene component the simulation was built for:
//! a 10×10 grid, gravity pointing down at 10 m/s², unit density and a
//! correction divisor of 1000.

use crate::error::{SurfaceError, SurfaceResult};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MIN_RESOLUTION: u32 = 10;
pub const MAX_RESOLUTION: u32 = 1000;
pub const MIN_ACCELERATION_CORRECTION: u32 = 1;
pub const MAX_ACCELERATION_CORRECTION: u32 = 10_000;
pub const MAX_GROUP_WIDTH: u32 = 16;

const DEFAULT_GRAVITY: [f32; 3] = [0.0, -10.0, 0.0];
const DEFAULT_ACCELERATION_CORRECTION: u32 = 1000;

/// Edge length of the active grid, always within `10..=1000`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct GridResolution(u32);

impl GridResolution {
    pub fn new(value: u32) -> SurfaceResult<Self> {
        if (MIN_RESOLUTION..=MAX_RESOLUTION).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SurfaceError::ResolutionOutOfRange(value))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Spacing between neighbouring points over the `[-1, 1]` square.
    pub fn step(self) -> f32 {
        2.0 / self.0 as f32
    }

    pub fn point_count(self) -> u32 {
        self.0 * self.0
    }

    /// Fixed backing capacity, independent of the active resolution.
    pub fn capacity() -> u32 {
        MAX_RESOLUTION * MAX_RESOLUTION
    }
}

impl TryFrom<u32> for GridResolution {
    type Error = SurfaceError;

    fn try_from(value: u32) -> SurfaceResult<Self> {
        Self::new(value)
    }
}

impl From<GridResolution> for u32 {
    fn from(resolution: GridResolution) -> u32 {
        resolution.0
    }
}

/// Law used to blend the surface normal toward the instantaneous force.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum SmoothingLaw {
    /// Blend factor is the raw frame delta, unclamped. Overshoots when `dt > 1`.
    RawDelta,
    /// Blend factor is the raw frame delta clamped into `[0, 1]`.
    ClampedDelta,
    /// Blend factor is `1 - exp(-dt / tau)`.
    TimeConstant { tau: f32 },
}

impl SmoothingLaw {
    pub fn validate(&self) -> SurfaceResult<()> {
        if let SmoothingLaw::TimeConstant { tau } = *self {
            if !(tau > 0.0 && tau.is_finite()) {
                return Err(SurfaceError::InvalidConfig(format!(
                    "smoothing time constant must be positive, got {}",
                    tau
                )));
            }
        }
        Ok(())
    }

    pub fn factor(&self, dt: f32) -> f32 {
        match *self {
            SmoothingLaw::RawDelta => dt,
            SmoothingLaw::ClampedDelta => dt.clamp(0.0, 1.0),
            SmoothingLaw::TimeConstant { tau } => 1.0 - (-dt / tau).exp(),
        }
    }
}

impl Default for SmoothingLaw {
    fn default() -> Self {
        SmoothingLaw::RawDelta
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub resolution: u32,
    pub gravity: [f32; 3],
    /// Reserved; no stage consumes it yet.
    pub water_height: f32,
    pub density: f32,
    pub acceleration_correction: u32,
    /// Grid points per work-group edge.
    pub group_width: u32,
    pub smoothing: SmoothingLaw,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            resolution: MIN_RESOLUTION,
            gravity: DEFAULT_GRAVITY,
            water_height: 0.0,
            density: 1.0,
            acceleration_correction: DEFAULT_ACCELERATION_CORRECTION,
            group_width: 1,
            smoothing: SmoothingLaw::default(),
        }
    }
}

impl SurfaceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> SurfaceResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> SurfaceResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SurfaceResult<()> {
        GridResolution::new(self.resolution)?;

        if !(MIN_ACCELERATION_CORRECTION..=MAX_ACCELERATION_CORRECTION)
            .contains(&self.acceleration_correction)
        {
            return Err(SurfaceError::InvalidConfig(format!(
                "acceleration_correction {} is outside {}..={}",
                self.acceleration_correction,
                MIN_ACCELERATION_CORRECTION,
                MAX_ACCELERATION_CORRECTION
            )));
        }

        if self.group_width == 0 || self.group_width > MAX_GROUP_WIDTH {
            return Err(SurfaceError::InvalidConfig(format!(
                "group_width {} is outside 1..={}",
                self.group_width, MAX_GROUP_WIDTH
            )));
        }

        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(SurfaceError::InvalidConfig("gravity must be finite".into()));
        }
        if !self.density.is_finite() {
            return Err(SurfaceError::InvalidConfig("density must be finite".into()));
        }
        if !self.water_height.is_finite() {
            return Err(SurfaceError::InvalidConfig("water_height must be finite".into()));
        }

        self.smoothing.validate()
    }

    pub fn grid_resolution(&self) -> SurfaceResult<GridResolution> {
        GridResolution::new(self.resolution)
    }

    pub fn gravity_vector(&self) -> Vec3 {
        Vec3::from_array(self.gravity)
    }
}
