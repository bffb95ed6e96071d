//! Headless driver for the reactive surface.
//!
//! Moves a container along a scripted sway/tilt path for a number of frames,
//! runs the react kernel every frame and draws the field offscreen. The final
//! positions can be exported as `.npy` and the last frame saved as PNG.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::Vec3;
use reactive_surface::{
    gpu::GpuContext,
    transform::{ContainerTransform, ScriptedMotion},
    GpuComputeStage, SimulationStepDriver, SmoothingLaw, SurfaceConfig, SurfaceRenderer,
};
use std::{path::PathBuf, sync::Arc};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Smoothing {
    Raw,
    Clamped,
    TimeConstant,
}

#[derive(Parser, Debug)]
#[command(name = "reactive_surface")]
#[command(about = "GPU surface that reacts to the motion of its container")]
struct Args {
    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid edge length (10..=1000)
    #[arg(long)]
    resolution: Option<u32>,

    #[arg(long)]
    density: Option<f32>,

    /// Divisor applied to the container acceleration (1..=10000)
    #[arg(long)]
    acceleration_correction: Option<u32>,

    /// Grid points per work-group edge
    #[arg(long)]
    group_width: Option<u32>,

    #[arg(long, value_enum)]
    smoothing: Option<Smoothing>,

    /// Time constant in seconds for --smoothing time-constant
    #[arg(long, default_value = "0.25")]
    tau: f32,

    /// Number of frames to simulate
    #[arg(long, default_value = "240")]
    frames: u32,

    /// Frames appended at the end with the container held still
    #[arg(long, default_value = "60")]
    settle_frames: u32,

    /// Frame time in seconds
    #[arg(long, default_value = "0.016")]
    dt: f32,

    /// Sway amplitude along X
    #[arg(long, default_value = "0.5")]
    sway: f32,

    /// Sway frequency in Hz
    #[arg(long, default_value = "0.5")]
    frequency: f32,

    /// Tilt rate around Z in degrees per second
    #[arg(long, default_value = "0")]
    tilt: f32,

    /// Write the final positions to this .npy file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Save the last rendered frame to this PNG file
    #[arg(long)]
    save_frame: Option<PathBuf>,

    #[arg(long, default_value = "800")]
    width: u32,

    #[arg(long, default_value = "600")]
    height: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = build_config(&args)?;
    log::info!("Configuration: {:?}", config);

    let gpu = Arc::new(GpuContext::new_blocking()?);
    let compute = GpuComputeStage::new(gpu.clone(), config.group_width)?;
    let renderer = SurfaceRenderer::new(gpu.clone(), args.width, args.height)?;
    let mut driver = SimulationStepDriver::new(config, compute, renderer)?;

    let motion =
        ScriptedMotion::sway(Vec3::ZERO, args.sway, args.frequency).with_tilt(args.tilt);
    let mut container = ContainerTransform::new(motion.position_at(0.0));

    driver.enable(container.position())?;
    let result = run_frames(&mut driver, &motion, &mut container, &args);
    if let Err(err) = &result {
        log::error!("Simulation aborted: {:#}", err);
    }

    if result.is_ok() {
        export_results(&driver, &args)?;
    }

    driver.disable()?;
    result
}

fn build_config(args: &Args) -> Result<SurfaceConfig> {
    let mut config = match &args.config {
        Some(path) => SurfaceConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SurfaceConfig::default(),
    };

    if let Some(resolution) = args.resolution {
        config.resolution = resolution;
    }
    if let Some(density) = args.density {
        config.density = density;
    }
    if let Some(correction) = args.acceleration_correction {
        config.acceleration_correction = correction;
    }
    if let Some(group_width) = args.group_width {
        config.group_width = group_width;
    }
    if let Some(smoothing) = args.smoothing {
        config.smoothing = match smoothing {
            Smoothing::Raw => SmoothingLaw::RawDelta,
            Smoothing::Clamped => SmoothingLaw::ClampedDelta,
            Smoothing::TimeConstant => SmoothingLaw::TimeConstant { tau: args.tau },
        };
    }

    config.validate()?;
    Ok(config)
}

fn run_frames(
    driver: &mut SimulationStepDriver<GpuComputeStage, SurfaceRenderer>,
    motion: &ScriptedMotion,
    container: &mut ContainerTransform,
    args: &Args,
) -> Result<()> {
    let moving_frames = args.frames;
    let total_frames = args.frames + args.settle_frames;

    for frame in 1..=total_frames {
        if frame <= moving_frames {
            motion.apply(container, frame as f32 * args.dt, args.dt);
        }
        driver
            .renderer_mut()
            .set_container_transform(container.local_to_world());

        let report = driver
            .frame(container.position(), args.dt)
            .with_context(|| format!("frame {}", frame))?;

        log::debug!(
            "frame {:4}: accel {:?} normal {:?} still {:.3}s",
            frame,
            report.motion.acceleration,
            report.force.smoothed,
            report.stillness
        );
    }

    log::info!(
        "Ran {} frames; {} dispatches pending before drain",
        total_frames,
        driver.compute().pending()
    );
    Ok(())
}

fn export_results(
    driver: &SimulationStepDriver<GpuComputeStage, SurfaceRenderer>,
    args: &Args,
) -> Result<()> {
    if let Some(path) = &args.snapshot {
        let buffers = driver.field().buffers()?;
        let count = driver.resolution().point_count();
        let points = driver.compute().read_positions(buffers, count)?;
        reactive_surface::snapshot::write_points(path, &points)?;
    }

    if let Some(path) = &args.save_frame {
        driver.renderer().save_frame(path)?;
    }

    Ok(())
}
