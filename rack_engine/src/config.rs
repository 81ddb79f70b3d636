use std::{fs, path::Path};

use rack_model::RackGeometry;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading engine config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

/// Tunables for a mounted scene. Every field has a default so a config file
/// only needs the values it overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub geometry: RackGeometry,
    pub particles: ParticleConfig,
    pub camera: CameraConfig,
    pub tour: TourConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    /// Velocity band (world units per second) for rows without equipment.
    pub base_velocity: [f32; 2],
    /// Faster band for rows crossing populated slots.
    pub populated_velocity: [f32; 2],
    /// How far in front of the intake a recycled particle may respawn.
    pub reset_margin: f32,
    pub cold_color: [f32; 3],
    pub hot_color: [f32; 3],
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 300,
            base_velocity: [0.4, 0.8],
            populated_velocity: [0.9, 1.6],
            reset_margin: 0.3,
            cold_color: [0.2, 0.6, 1.0],
            hot_color: [1.0, 0.3, 0.1],
            seed: 0x5eed_2ac4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Preset distance from the rack center at zoom 1.0.
    pub base_distance: f32,
    /// Fraction of the remaining distance covered per 60 Hz frame.
    pub lerp_rate: f32,
    pub arrive_epsilon: f32,
    pub max_frame_dt: f32,
    pub fov_y_degrees: f32,
    pub tour_y_offset: f32,
    pub tour_distance: f32,
    /// Initial camera position relative to the rack center.
    pub mount_offset: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            base_distance: 7.0,
            lerp_rate: 0.05,
            arrive_epsilon: 1e-3,
            max_frame_dt: 0.1,
            fov_y_degrees: 50.0,
            tour_y_offset: 0.3,
            tour_distance: 2.5,
            mount_offset: [4.0, 1.5, 5.5],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    pub dwell_seconds: f32,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self { dwell_seconds: 3.0 }
    }
}

impl EngineConfig {
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let geometry = &self.geometry;
        if geometry.unit_height <= 0.0 || geometry.width <= 0.0 || geometry.depth <= 0.0 {
            return Err(ConfigError::Invalid(
                "rack geometry dimensions must be positive".to_string(),
            ));
        }
        if geometry.side_gap < 0.0 {
            return Err(ConfigError::Invalid("side_gap must not be negative".to_string()));
        }

        let particles = &self.particles;
        for (name, band) in [
            ("base_velocity", particles.base_velocity),
            ("populated_velocity", particles.populated_velocity),
        ] {
            if band[0] <= 0.0 || band[0] > band[1] {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive [min, max] band (got {band:?})"
                )));
            }
        }
        if particles.reset_margin < 0.0 {
            return Err(ConfigError::Invalid(
                "reset_margin must not be negative".to_string(),
            ));
        }

        let camera = &self.camera;
        if !(camera.lerp_rate > 0.0 && camera.lerp_rate <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "lerp_rate must be within (0, 1] (got {})",
                camera.lerp_rate
            )));
        }
        if camera.base_distance <= 0.0 || camera.arrive_epsilon <= 0.0 || camera.max_frame_dt <= 0.0
        {
            return Err(ConfigError::Invalid(
                "camera distances and max_frame_dt must be positive".to_string(),
            ));
        }
        if !(1.0..179.0).contains(&camera.fov_y_degrees) {
            return Err(ConfigError::Invalid(format!(
                "fov_y_degrees out of range (got {})",
                camera.fov_y_degrees
            )));
        }

        if self.tour.dwell_seconds <= 0.0 {
            return Err(ConfigError::Invalid(
                "tour dwell must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
