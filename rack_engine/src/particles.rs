//! Recycling airflow particle pool.
//!
//! Particles enter at the rack's front face, drift toward the rear along -Z
//! and are respawned at the intake once they pass the rear boundary. The pool
//! is sized once at mount; `advance` only rewrites existing slots and the
//! companion vertex buffer, so the per-frame path never allocates.

use std::{fmt, str::FromStr};

use bytemuck::{cast_slice, Pod, Zeroable};
use glam::Vec3;
use rack_model::{RackGeometry, Rgb};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::ParticleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirflowMode {
    #[default]
    Off,
    /// Particles in the intake color only.
    Flow,
    /// Particles shift from cold to hot while crossing the rack.
    Thermal,
    /// Thermal particles plus exhaust tint on the equipment blocks.
    Both,
}

impl AirflowMode {
    pub fn particles_enabled(self) -> bool {
        !matches!(self, AirflowMode::Off)
    }

    pub fn thermal_gradient(self) -> bool {
        matches!(self, AirflowMode::Thermal | AirflowMode::Both)
    }

    pub fn tints_equipment(self) -> bool {
        matches!(self, AirflowMode::Both)
    }

    pub fn label(self) -> &'static str {
        match self {
            AirflowMode::Off => "off",
            AirflowMode::Flow => "flow",
            AirflowMode::Thermal => "thermal",
            AirflowMode::Both => "both",
        }
    }
}

impl fmt::Display for AirflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AirflowMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(AirflowMode::Off),
            "flow" => Ok(AirflowMode::Flow),
            "thermal" => Ok(AirflowMode::Thermal),
            "both" => Ok(AirflowMode::Both),
            _ => Err(format!(
                "unknown airflow mode '{value}' (expected off, flow, thermal or both)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: f32,
    /// 0.0 at the intake, 1.0 at the exhaust.
    pub color_state: f32,
}

/// GPU-ready particle record; the buffer is rewritten in place every tick.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

pub struct AirflowSimulator {
    particles: Vec<Particle>,
    vertices: Vec<ParticleVertex>,
    /// `populated_rows[u - 1]` is true when any equipment covers slot `u`.
    populated_rows: Vec<bool>,
    rng: StdRng,
    front_z: f32,
    rear_z: f32,
    depth: f32,
    half_width: f32,
    height: f32,
    unit_height: f32,
    reset_margin: f32,
    base_velocity: [f32; 2],
    populated_velocity: [f32; 2],
    cold: Rgb,
    hot: Rgb,
    gradient: bool,
    enabled: bool,
}

impl AirflowSimulator {
    pub fn new(config: &ParticleConfig, geometry: &RackGeometry, size_u: u32) -> Self {
        let mut simulator = Self {
            particles: Vec::with_capacity(config.count),
            vertices: Vec::with_capacity(config.count),
            populated_rows: vec![false; size_u as usize],
            rng: StdRng::seed_from_u64(config.seed),
            front_z: geometry.front_z(),
            rear_z: geometry.rear_z(),
            depth: geometry.depth,
            half_width: geometry.width * 0.5,
            height: geometry.rack_height(size_u),
            unit_height: geometry.unit_height,
            reset_margin: config.reset_margin,
            base_velocity: config.base_velocity,
            populated_velocity: config.populated_velocity,
            cold: Rgb(config.cold_color),
            hot: Rgb(config.hot_color),
            gradient: true,
            enabled: false,
        };

        // Initial spawn spreads the pool over the whole depth so the first
        // frames do not show a single wall of particles.
        for _ in 0..config.count {
            let mut particle = simulator.respawn();
            particle.position.z = simulator
                .rng
                .gen_range(simulator.rear_z..=simulator.front_z + simulator.reset_margin);
            particle.color_state = simulator.progress(particle.position.z);
            simulator.particles.push(particle);
            simulator.vertices.push(ParticleVertex::zeroed());
        }
        simulator.write_vertices();
        simulator
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_gradient(&mut self, gradient: bool) {
        self.gradient = gradient;
    }

    /// Refreshes the populated-row lookup without reallocating.
    pub fn set_occupancy<I>(&mut self, occupied_units: I)
    where
        I: IntoIterator<Item = u32>,
    {
        self.populated_rows.fill(false);
        for u in occupied_units {
            if let Some(slot) = (u as usize)
                .checked_sub(1)
                .and_then(|index| self.populated_rows.get_mut(index))
            {
                *slot = true;
            }
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn vertices(&self) -> &[ParticleVertex] {
        &self.vertices
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        cast_slice(&self.vertices)
    }

    pub fn front_z(&self) -> f32 {
        self.front_z
    }

    pub fn rear_z(&self) -> f32 {
        self.rear_z
    }

    pub fn reset_margin(&self) -> f32 {
        self.reset_margin
    }

    /// Moves every particle by `dt` seconds. A disabled simulator leaves the
    /// pool frozen where it stopped.
    pub fn advance(&mut self, dt: f32) -> &[Particle] {
        if !self.enabled || dt <= 0.0 {
            return &self.particles;
        }

        for index in 0..self.particles.len() {
            let mut particle = self.particles[index];
            particle.position.z -= particle.velocity * dt;
            if particle.position.z < self.rear_z {
                particle = self.respawn();
            } else {
                particle.color_state = self.progress(particle.position.z);
            }
            self.particles[index] = particle;
        }
        self.write_vertices();
        &self.particles
    }

    fn progress(&self, z: f32) -> f32 {
        ((self.front_z - z) / self.depth).clamp(0.0, 1.0)
    }

    fn respawn(&mut self) -> Particle {
        let x = self.rng.gen_range(-self.half_width..=self.half_width);
        let y = self.rng.gen_range(0.0..=self.height);
        let z = self.front_z + self.rng.gen_range(0.0..=self.reset_margin);
        let band = if self.row_is_populated(y) {
            self.populated_velocity
        } else {
            self.base_velocity
        };
        let velocity = self.rng.gen_range(band[0]..=band[1]);
        Particle {
            position: Vec3::new(x, y, z),
            velocity,
            color_state: 0.0,
        }
    }

    fn row_is_populated(&self, y: f32) -> bool {
        let row = (y / self.unit_height).floor().max(0.0) as usize;
        let row = row.min(self.populated_rows.len().saturating_sub(1));
        self.populated_rows.get(row).copied().unwrap_or(false)
    }

    fn write_vertices(&mut self) {
        for (vertex, particle) in self.vertices.iter_mut().zip(&self.particles) {
            let color = if self.gradient {
                self.cold.lerp(self.hot, particle.color_state)
            } else {
                self.cold
            };
            *vertex = ParticleVertex {
                position: particle.position.to_array(),
                color: color.0,
            };
        }
    }
}
