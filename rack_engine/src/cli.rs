use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use rack_engine::camera::ViewPreset;
use rack_engine::particles::AirflowMode;

#[derive(Parser, Debug)]
#[command(
    about = "Headless host that mounts a rack scene and steps it frame by frame",
    version
)]
pub struct Args {
    /// Rack snapshot JSON (rack, equipment, ports, cables, annotations, active ports)
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Optional engine config JSON overriding geometry, particle, camera, and tour defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only print the occupancy summary and elevation; do not mount a scene
    #[arg(long)]
    pub occupancy_only: bool,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 240)]
    pub frames: u32,

    /// Fixed frame rate used to derive the per-frame delta
    #[arg(long, default_value_t = 60.0)]
    pub fps: f32,

    /// Airflow visualization mode: off, flow, thermal, or both
    #[arg(long, default_value = "off")]
    pub airflow: AirflowMode,

    /// Render equipment and frame translucent
    #[arg(long)]
    pub xray: bool,

    /// Hide annotation markers and labels
    #[arg(long)]
    pub hide_annotations: bool,

    /// Camera zoom factor (clamped to 0.5-3.0)
    #[arg(long, default_value_t = 1.0)]
    pub zoom: f32,

    /// Camera preset to fly to on the first frame
    #[arg(long)]
    pub preset: Option<ViewPreset>,

    /// Start the guided tour on the first frame
    #[arg(long)]
    pub tour: bool,

    /// Override the particle RNG seed from the config
    #[arg(long)]
    pub seed: Option<u64>,

    /// Path to write sampled frame reports as JSON
    #[arg(long)]
    pub frame_log_json: Option<PathBuf>,

    /// Record every Nth frame into the frame log (requires --frame-log-json)
    #[arg(long, default_value_t = 1)]
    pub sample_every: u32,

    /// Path to write the occupancy report and elevation as JSON
    #[arg(long)]
    pub occupancy_json: Option<PathBuf>,

    /// Viewport width in pixels used for annotation label projection
    #[arg(long, default_value_t = 1280.0)]
    pub viewport_width: f32,

    /// Viewport height in pixels used for annotation label projection
    #[arg(long, default_value_t = 720.0)]
    pub viewport_height: f32,
}

#[derive(Debug)]
pub enum Command {
    Simulate(SimulateArgs),
    Occupancy(OccupancyArgs),
}

#[derive(Debug)]
pub struct SimulateArgs {
    pub snapshot: PathBuf,
    pub config: Option<PathBuf>,
    pub frames: u32,
    pub fps: f32,
    pub airflow: AirflowMode,
    pub xray: bool,
    pub show_annotations: bool,
    pub zoom: f32,
    pub preset: Option<ViewPreset>,
    pub tour: bool,
    pub seed: Option<u64>,
    pub frame_log_json: Option<PathBuf>,
    pub sample_every: u32,
    pub occupancy_json: Option<PathBuf>,
    pub viewport: [f32; 2],
}

#[derive(Debug)]
pub struct OccupancyArgs {
    pub snapshot: PathBuf,
    pub occupancy_json: Option<PathBuf>,
}

pub fn parse() -> Result<Command> {
    let args = Args::parse();
    args.into_command()
}

impl Args {
    fn into_command(self) -> Result<Command> {
        if self.occupancy_only {
            if self.frame_log_json.is_some() {
                bail!("--frame-log-json cannot be combined with --occupancy-only");
            }
            return Ok(Command::Occupancy(OccupancyArgs {
                snapshot: self.snapshot,
                occupancy_json: self.occupancy_json,
            }));
        }

        if !self.fps.is_finite() || self.fps <= 0.0 {
            bail!("--fps must be a positive number (got {})", self.fps);
        }
        if !self.zoom.is_finite() {
            bail!("--zoom must be finite");
        }
        if self.sample_every == 0 {
            bail!("--sample-every must be at least 1");
        }
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            bail!("viewport dimensions must be positive");
        }

        Ok(Command::Simulate(SimulateArgs {
            snapshot: self.snapshot,
            config: self.config,
            frames: self.frames,
            fps: self.fps,
            airflow: self.airflow,
            xray: self.xray,
            show_annotations: !self.hide_annotations,
            zoom: self.zoom,
            preset: self.preset,
            tour: self.tour,
            seed: self.seed,
            frame_log_json: self.frame_log_json,
            sample_every: self.sample_every,
            occupancy_json: self.occupancy_json,
            viewport: [self.viewport_width, self.viewport_height],
        }))
    }
}
