//! JSON configuration parsing for headless mode
//!
//! A scenario lists the actors to spawn (team, position, health, weapons,
//! ammo pools, resistances, AI parameters) plus match-level settings.

use std::collections::BTreeSet;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::abilities::HandleWeaponConfig;
use crate::character::health::HealthConfig;
use crate::character::resistance::DamageResistance;
use crate::character::ActorConfig;
use crate::error::{ConfigError, Result};
use crate::weapon::{AmmoId, AmmoPool, WeaponDefinitions};

/// Headless scenario loaded from JSON
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub actors: Vec<ActorSpec>,
    /// Maximum match duration in seconds (default: 300)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic match reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Custom output path for the combat log
    #[serde(default)]
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSpec {
    pub name: String,
    pub team: u8,
    #[serde(default)]
    pub position: (f32, f32),
    #[serde(default)]
    pub health: HealthConfig,
    /// Weapon names from the weapon definitions. The first is equipped at
    /// spawn; with more than one the actor can switch between them.
    pub weapons: Vec<String>,
    #[serde(default)]
    pub ammo_pools: Vec<AmmoPoolSpec>,
    #[serde(default)]
    pub resistances: Vec<DamageResistance>,
    #[serde(default)]
    pub handle_weapon: HandleWeaponConfig,
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f32,
    #[serde(default)]
    pub brain: BrainConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmmoPoolSpec {
    pub id: String,
    pub magazine_size: u32,
    pub reserve: u32,
}

/// AI tuning for one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Distance the actor tries to keep from its target
    pub preferred_range: f32,
    /// Maximum aim error in radians, either side
    pub aim_spread: f32,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            preferred_range: 6.0,
            aim_spread: 0.05,
        }
    }
}

fn default_max_duration() -> f32 {
    300.0
}

fn default_walk_speed() -> f32 {
    4.0
}

impl ActorSpec {
    pub fn to_actor_config(&self) -> ActorConfig {
        let position = Vec2::new(self.position.0, self.position.1);
        ActorConfig {
            name: self.name.clone(),
            team: self.team,
            position,
            facing: if position.x > 0.0 { Vec2::NEG_X } else { Vec2::X },
            health: self.health.clone(),
            resistances: self.resistances.clone(),
            ammo_pools: self
                .ammo_pools
                .iter()
                .map(|p| (AmmoId(p.id.clone()), AmmoPool::new(p.magazine_size, p.reserve)))
                .collect(),
            animator_sanity_checks: false,
        }
    }
}

impl ScenarioConfig {
    /// Load a scenario from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: origin.clone(),
            source,
        })?;
        Self::from_json(&contents, &origin)
    }

    pub fn from_json(contents: &str, origin: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|source| ConfigError::Json {
            path: origin.to_string(),
            source,
        })
    }

    /// Check the scenario against itself and the loaded weapon definitions.
    pub fn validate(&self, weapons: &WeaponDefinitions) -> Result<()> {
        if self.actors.len() < 2 {
            return Err(ConfigError::Invalid(
                "scenario needs at least 2 actors".to_string(),
            ));
        }
        let teams: BTreeSet<u8> = self.actors.iter().map(|a| a.team).collect();
        if teams.len() < 2 {
            return Err(ConfigError::Invalid(
                "scenario needs actors on at least 2 teams".to_string(),
            ));
        }
        if self.max_duration_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_duration_secs must be positive, got {}",
                self.max_duration_secs
            )));
        }

        let mut names = BTreeSet::new();
        for actor in &self.actors {
            if !names.insert(actor.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate actor name '{}'",
                    actor.name
                )));
            }
            if actor.weapons.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "actor '{}' has no weapons",
                    actor.name
                )));
            }
            for weapon in &actor.weapons {
                weapons.require(weapon)?;
            }
            if actor.walk_speed < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "actor '{}' has a negative walk_speed",
                    actor.name
                )));
            }
        }
        Ok(())
    }
}
