//! Startup configuration: steering weights, radii, capacity and playfield.

use crate::components::{Aabb, Team};
use crate::error::ConfigError;
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Blend weights of the steering behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringWeights {
    pub separation: f32,
    pub alignment: f32,
    pub cohesion: f32,
    pub pursuit: f32,
    pub goal: f32,
}

impl Default for SteeringWeights {
    fn default() -> Self {
        Self {
            separation: 1.0,
            alignment: 1.0,
            cohesion: 0.5,
            pursuit: 1.0,
            goal: 0.5,
        }
    }
}

impl SteeringWeights {
    /// Sum of all weights; the blended force is divided by this.
    pub fn total(&self) -> f32 {
        self.separation + self.alignment + self.cohesion + self.pursuit + self.goal
    }

    fn all(&self) -> [f32; 5] {
        [self.separation, self.alignment, self.cohesion, self.pursuit, self.goal]
    }
}

/// Simulation configuration, fixed for the lifetime of a [`crate::SimWorld`].
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub weights: SteeringWeights,
    /// Gain applied to the blended steering force before integration.
    pub rate_of_gain: f32,
    /// Same-team units closer than this push each other apart.
    pub separation_distance: f32,
    /// Spatial grid cell size. Should be at least the largest vision range.
    pub cell_size: f32,
    /// Fixed population cap of the entity store.
    pub max_units: usize,
    /// Playfield width and height; projectiles outside are destroyed.
    pub playfield: Vec2,
    /// Destination of each team (index 0 = team one, 1 = team two).
    pub destinations: [Vec2; 2],
    /// Travel speed of projectiles, world units per second.
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    /// Tick length used by [`crate::SimWorld::step`].
    pub fixed_timestep: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        let playfield = Vec2::new(900.0, 900.0);
        Self {
            weights: SteeringWeights::default(),
            rate_of_gain: 1.0,
            separation_distance: 20.0,
            cell_size: 200.0,
            max_units: 5000,
            playfield,
            destinations: [
                Vec2::new(playfield.x / 2.0, 0.0),
                Vec2::new(playfield.x / 2.0, playfield.y),
            ],
            projectile_speed: 100.0,
            projectile_radius: 5.0,
            fixed_timestep: 1.0 / 60.0,
        }
    }
}

impl SimConfig {
    /// Parse a JSON config. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weights.all().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Invalid(
                "steering weights must be finite and non-negative".into(),
            ));
        }
        if self.weights.total() <= 0.0 {
            return Err(ConfigError::Invalid(
                "steering weights must not all be zero".into(),
            ));
        }
        if !(self.rate_of_gain.is_finite() && self.rate_of_gain >= 0.0) {
            return Err(ConfigError::Invalid(
                "rate_of_gain must be finite and non-negative".into(),
            ));
        }
        if !(self.separation_distance.is_finite() && self.separation_distance >= 0.0) {
            return Err(ConfigError::Invalid(
                "separation_distance must be finite and non-negative".into(),
            ));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::Invalid("cell_size must be positive".into()));
        }
        if self.cell_size < self.separation_distance {
            return Err(ConfigError::Invalid(format!(
                "cell_size {} is smaller than separation_distance {}",
                self.cell_size, self.separation_distance
            )));
        }
        if self.max_units == 0 || self.max_units > u32::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "max_units must be in 1..={}",
                u32::MAX
            )));
        }
        if !(self.playfield.is_finite() && self.playfield.x > 0.0 && self.playfield.y > 0.0) {
            return Err(ConfigError::Invalid("playfield must have positive size".into()));
        }
        if self.destinations.iter().any(|d| !d.is_finite()) {
            return Err(ConfigError::Invalid("destinations must be finite".into()));
        }
        if !(self.fixed_timestep > 0.0) {
            return Err(ConfigError::Invalid("fixed_timestep must be positive".into()));
        }
        if !(self.projectile_speed.is_finite() && self.projectile_speed >= 0.0)
            || !(self.projectile_radius.is_finite() && self.projectile_radius >= 0.0)
        {
            return Err(ConfigError::Invalid(
                "projectile speed and radius must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Playfield bounds, anchored at the origin.
    pub fn bounds(&self) -> Aabb {
        Aabb::new(Vec2::ZERO, self.playfield)
    }

    #[inline]
    pub fn destination(&self, team: Team) -> Vec2 {
        self.destinations[team.slot()]
    }
}
