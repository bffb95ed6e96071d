pub mod compute;
pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod force;
pub mod gpu;
pub mod kinematics;
pub mod render;
pub mod snapshot;
pub mod stage;
pub mod test_utils;
pub mod transform;

pub use compute::{GpuComputeStage, SurfaceParameters};
pub use config::{GridResolution, SmoothingLaw, SurfaceConfig};
pub use driver::{DriverState, FrameReport, SimulationStepDriver};
pub use error::{SurfaceError, SurfaceResult};
pub use render::SurfaceRenderer;
