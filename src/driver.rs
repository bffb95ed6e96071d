//! Per-frame driver of the reactive surface.
//!
//! ```text
//! Disabled --enable--> Initializing --frame--> Running
//!    ^                      |                     |
//!    +-------disable--------+---------------------+
//! ```
//!
//! Enabling allocates the field, fixes the step size for the session and
//! runs the init kernel once. Each frame estimates container motion, blends
//! the surface normal, pushes the kernel parameters, dispatches the react
//! kernel and issues one instanced draw. Disabling (and dropping an enabled
//! driver) drains the compute stage before the buffers are released.

use crate::compute::SurfaceParameters;
use crate::config::{GridResolution, SurfaceConfig};
use crate::error::{SurfaceError, SurfaceResult};
use crate::field::SurfaceField;
use crate::force::{BlendedForce, ForceBlender};
use crate::kinematics::{KinematicEstimator, MotionSample};
use crate::stage::{ComputeStage, DispatchSize, InstancedDraw, Kernel, RenderStage};
use glam::Vec3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DriverState {
    Disabled,
    Initializing,
    Running,
}

/// What one frame pushed through the stages.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub motion: MotionSample,
    pub stillness: f32,
    pub force: BlendedForce,
    pub dispatch: DispatchSize,
    pub draw: InstancedDraw,
}

/// Resolution and step captured when the driver was enabled.
#[derive(Copy, Clone, Debug)]
struct Session {
    resolution: GridResolution,
    step: f32,
}

pub struct SimulationStepDriver<C, R>
where
    C: ComputeStage,
    R: RenderStage<C::Buffers>,
{
    config: SurfaceConfig,
    resolution: GridResolution,
    session: Option<Session>,
    state: DriverState,
    estimator: KinematicEstimator,
    blender: ForceBlender,
    field: SurfaceField<C::Buffers>,
    compute: C,
    renderer: R,
}

impl<C, R> SimulationStepDriver<C, R>
where
    C: ComputeStage,
    R: RenderStage<C::Buffers>,
{
    pub fn new(config: SurfaceConfig, compute: C, renderer: R) -> SurfaceResult<Self> {
        config.validate()?;
        let resolution = config.grid_resolution()?;
        let blender = ForceBlender::from_config(&config)?;

        Ok(Self {
            config,
            resolution,
            session: None,
            state: DriverState::Disabled,
            estimator: KinematicEstimator::default(),
            blender,
            field: SurfaceField::new(),
            compute,
            renderer,
        })
    }

    pub fn enable(&mut self, position: Vec3) -> SurfaceResult<()> {
        if self.state != DriverState::Disabled {
            return Err(SurfaceError::AlreadyEnabled);
        }

        let resolution = self.resolution;
        let step = resolution.step();

        self.field.allocate(&mut self.compute)?;
        self.estimator.reset(position);
        self.blender.reset();

        let seeded = self
            .field
            .initialize(&mut self.compute, resolution, step, self.config.group_width);
        if let Err(err) = seeded {
            if let Err(release_err) = self.field.release(&mut self.compute) {
                log::warn!("Release after failed init also failed: {}", release_err);
            }
            return Err(err);
        }

        self.session = Some(Session { resolution, step });
        self.state = DriverState::Initializing;
        log::info!(
            "Surface enabled: resolution {}, step {}, group width {}",
            resolution.get(),
            step,
            self.config.group_width
        );
        Ok(())
    }

    /// Advances one frame for a container observed at `position`, `dt`
    /// seconds after the previous frame.
    ///
    /// The motion estimate and the smoothed normal are only committed once
    /// the draw has been issued; a frame rejected at any stage leaves them
    /// as they were.
    pub fn frame(&mut self, position: Vec3, dt: f32) -> SurfaceResult<FrameReport> {
        let session = self.session.ok_or(SurfaceError::Disabled)?;

        let mut estimator = self.estimator.clone();
        let mut blender = self.blender.clone();
        let motion = estimator.observe(position, dt)?;
        let stillness = estimator.stillness();
        let force = blender.blend(motion.acceleration, dt);

        let parameters = SurfaceParameters::for_grid(session.resolution, session.step)
            .with_timing(stillness, dt)
            .with_water(position, force.smoothed)
            .with_gravity(blender.gravity());
        self.compute.write_parameters(&parameters)?;

        let dispatch = DispatchSize::for_grid(self.resolution, self.config.group_width);
        self.field.dispatch(&mut self.compute, Kernel::React, dispatch)?;

        let draw = InstancedDraw::for_grid(self.resolution, session.step);
        self.renderer.draw(self.field.buffers()?, &draw)?;

        self.estimator = estimator;
        self.blender = blender;
        self.state = DriverState::Running;
        log::trace!(
            "frame dt={} stillness={} normal={:?} groups={:?}",
            dt,
            stillness,
            force.smoothed,
            dispatch
        );

        Ok(FrameReport {
            motion,
            stillness,
            force,
            dispatch,
            draw,
        })
    }

    pub fn disable(&mut self) -> SurfaceResult<()> {
        if self.state == DriverState::Disabled {
            return Err(SurfaceError::Disabled);
        }
        self.state = DriverState::Disabled;
        self.session = None;
        let released = self.field.release(&mut self.compute);
        log::info!("Surface disabled");
        released
    }

    /// Changes the dispatched and drawn sub-range. The step size and the
    /// resolution seen by the kernels stay fixed until the next enable.
    pub fn set_resolution(&mut self, resolution: u32) -> SurfaceResult<()> {
        self.resolution = GridResolution::new(resolution)?;
        self.config.resolution = resolution;
        Ok(())
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state != DriverState::Disabled
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn resolution(&self) -> GridResolution {
        self.resolution
    }

    /// Step size of the current session, if enabled.
    pub fn step(&self) -> Option<f32> {
        self.session.map(|s| s.step)
    }

    pub fn stillness(&self) -> f32 {
        self.estimator.stillness()
    }

    pub fn normal(&self) -> Vec3 {
        self.blender.normal()
    }

    pub fn field(&self) -> &SurfaceField<C::Buffers> {
        &self.field
    }

    pub fn compute(&self) -> &C {
        &self.compute
    }

    pub fn compute_mut(&mut self) -> &mut C {
        &mut self.compute
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

impl<C, R> Drop for SimulationStepDriver<C, R>
where
    C: ComputeStage,
    R: RenderStage<C::Buffers>,
{
    fn drop(&mut self) {
        if self.is_enabled() {
            if let Err(err) = self.disable() {
                log::warn!("Surface release on drop failed: {}", err);
            }
        }
    }
}
