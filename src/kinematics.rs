//! Finite-difference motion estimate of the tracked container.

use crate::error::{SurfaceError, SurfaceResult};
use glam::Vec3;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MotionSample {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

/// Time accumulated since the acceleration was last non-zero.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StillnessTimer {
    elapsed: f32,
}

impl StillnessTimer {
    /// Only an exactly zero acceleration counts as still.
    pub fn advance(&mut self, acceleration: Vec3, dt: f32) {
        if acceleration == Vec3::ZERO {
            self.elapsed += dt;
        } else {
            self.elapsed = 0.0;
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[derive(Clone, Debug, Default)]
pub struct KinematicEstimator {
    sample: MotionSample,
    stillness: StillnessTimer,
}

impl KinematicEstimator {
    pub fn new(position: Vec3) -> Self {
        let mut estimator = Self::default();
        estimator.reset(position);
        estimator
    }

    /// Re-anchors the estimate at `position` with zero velocity and acceleration.
    pub fn reset(&mut self, position: Vec3) {
        self.sample = MotionSample {
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
        };
        self.stillness.reset();
    }

    /// Folds one position sample taken `dt` seconds after the previous one.
    ///
    /// A non-positive or non-finite `dt` is rejected without touching the
    /// estimate.
    pub fn observe(&mut self, position: Vec3, dt: f32) -> SurfaceResult<MotionSample> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SurfaceError::DegenerateTimeStep(dt));
        }

        let velocity = (position - self.sample.position) / dt;
        let acceleration = (velocity - self.sample.velocity) / dt;

        self.stillness.advance(acceleration, dt);
        self.sample = MotionSample {
            position,
            velocity,
            acceleration,
        };

        Ok(self.sample)
    }

    pub fn sample(&self) -> MotionSample {
        self.sample
    }

    pub fn stillness(&self) -> f32 {
        self.stillness.elapsed()
    }
}
