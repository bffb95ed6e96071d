//! Error types for the surface simulation.
//!
//! Every fallible library operation returns `SurfaceResult<T>`. Contract
//! violations (lifecycle order, degenerate time steps) are reported here
//! instead of faulting.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("resolution {0} is outside 10..=1000")]
    ResolutionOutOfRange(u32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Time deltas must be strictly positive and finite.
    #[error("degenerate time step: {0}")]
    DegenerateTimeStep(f32),

    #[error("surface field buffers are not allocated")]
    NotAllocated,

    #[error("surface field buffers are already allocated")]
    AlreadyAllocated,

    #[error("simulation driver is disabled")]
    Disabled,

    #[error("simulation driver is already enabled")]
    AlreadyEnabled,

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;
