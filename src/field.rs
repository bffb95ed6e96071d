//! Lifecycle of the three surface buffers.
//!
//! The buffers are created together at full capacity, seeded once by the
//! init kernel and released together. Any use while unallocated is
//! rejected with `SurfaceError::NotAllocated`.

use crate::compute::SurfaceParameters;
use crate::config::GridResolution;
use crate::error::{SurfaceError, SurfaceResult};
use crate::stage::{ComputeStage, DispatchSize, Kernel};

pub struct SurfaceField<B> {
    buffers: Option<B>,
    capacity: u32,
}

impl<B> Default for SurfaceField<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> SurfaceField<B> {
    pub fn new() -> Self {
        Self {
            buffers: None,
            capacity: GridResolution::capacity(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_allocated(&self) -> bool {
        self.buffers.is_some()
    }

    pub fn buffers(&self) -> SurfaceResult<&B> {
        self.buffers.as_ref().ok_or(SurfaceError::NotAllocated)
    }

    pub fn allocate<C>(&mut self, stage: &mut C) -> SurfaceResult<()>
    where
        C: ComputeStage<Buffers = B>,
    {
        if self.buffers.is_some() {
            return Err(SurfaceError::AlreadyAllocated);
        }
        self.buffers = Some(stage.allocate(self.capacity)?);
        log::info!(
            "Allocated surface field: 3 x {} points ({} bytes each)",
            self.capacity,
            self.capacity as u64 * 12
        );
        Ok(())
    }

    /// Drains in-flight work, then frees all three buffers. The buffers are
    /// freed even when draining fails; the drain error is still returned.
    pub fn release<C>(&mut self, stage: &mut C) -> SurfaceResult<()>
    where
        C: ComputeStage<Buffers = B>,
    {
        let buffers = self.buffers.take().ok_or(SurfaceError::NotAllocated)?;
        let drained = stage.drain();
        stage.release(buffers);
        log::info!("Released surface field");
        drained
    }

    /// Seeds positions and velocities over the active `resolution²` points.
    pub fn initialize<C>(
        &self,
        stage: &mut C,
        resolution: GridResolution,
        step: f32,
        group_width: u32,
    ) -> SurfaceResult<()>
    where
        C: ComputeStage<Buffers = B>,
    {
        let buffers = self.buffers()?;
        stage.write_parameters(&SurfaceParameters::for_grid(resolution, step))?;
        stage.dispatch(Kernel::Init, buffers, DispatchSize::for_grid(resolution, group_width))
    }

    pub fn dispatch<C>(
        &self,
        stage: &mut C,
        kernel: Kernel,
        size: DispatchSize,
    ) -> SurfaceResult<()>
    where
        C: ComputeStage<Buffers = B>,
    {
        stage.dispatch(kernel, self.buffers()?, size)
    }
}
