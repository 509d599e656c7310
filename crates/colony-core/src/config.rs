//! Simulation configuration.
//!
//! All tuning scalars the core consumes, loadable from a TOML file. Every
//! section is optional and falls back to its defaults.

use crate::tasks::TaskKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub colonists: ColonistConfig,
    #[serde(default)]
    pub work: WorkConfig,
    #[serde(default)]
    pub wander: WanderConfig,
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: i32,
    pub height: i32,
    /// Seed for the wandering RNG.
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonistConfig {
    pub count: u32,
    /// Cells per tick, capped at [`ColonistConfig::MAX_SPEED`]. A colonist
    /// reaches at most one waypoint per tick.
    pub speed: f32,
}

impl ColonistConfig {
    pub const MAX_SPEED: f32 = 1.0;

    /// Configured speed with the cap applied.
    pub fn effective_speed(&self) -> f32 {
        self.speed.min(Self::MAX_SPEED)
    }
}

impl Default for ColonistConfig {
    fn default() -> Self {
        Self {
            count: 3,
            speed: 0.25,
        }
    }
}

/// Work ticks needed to finish each kind of site work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkConfig {
    pub gather_ticks: u32,
    pub build_ticks: u32,
    pub furniture_ticks: u32,
    pub demolish_ticks: u32,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            gather_ticks: 20,
            build_ticks: 30,
            furniture_ticks: 25,
            demolish_ticks: 15,
        }
    }
}

impl WorkConfig {
    /// Zero for kinds that complete on arrival.
    pub fn threshold(&self, kind: &TaskKind) -> u32 {
        match kind {
            TaskKind::Gather => self.gather_ticks,
            TaskKind::Build(_) => self.build_ticks,
            TaskKind::Furniture(_) => self.furniture_ticks,
            TaskKind::Demolish => self.demolish_ticks,
            TaskKind::Haul { .. } | TaskKind::Pickup { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Per-tick chance that an idle, empty-handed colonist starts wandering.
    pub chance: f32,
    /// Maximum distance per axis of a wander target.
    pub radius: i32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            chance: 0.02,
            radius: 5,
        }
    }
}
