//! Data-driven weapon definitions
//!
//! Weapon archetypes are defined in `assets/config/weapons.ron` instead of
//! being hardcoded. Every field except the name has a default, so a
//! definition only lists what differs from a plain semi-automatic weapon.
//!
//! ## Usage
//! ```ignore
//! fn my_system(weapons: Res<WeaponDefinitions>) {
//!     let rifle = weapons.get("Rifle").unwrap();
//!     println!("Rifle reload time: {}", rifle.reload_time);
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::ammo::AmmoId;
use crate::character::resistance::TypedDamage;
use crate::error::{ConfigError, Result};

/// Default location of the weapon definitions file.
pub const DEFAULT_WEAPONS_PATH: &str = "assets/config/weapons.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TriggerMode {
    /// One attack per trigger pull
    #[default]
    SemiAuto,
    /// Keeps attacking while the trigger is held
    Auto,
}

/// Complete weapon configuration loaded from RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Display name (filled from the map key when loaded from a file)
    pub name: String,
    pub trigger_mode: TriggerMode,

    // === Timing ===
    /// Wind-up before the first attack, in seconds
    pub delay_before_use: f32,
    /// Releasing the trigger during the wind-up cancels the attack
    pub delay_before_use_release_interruption: bool,
    /// Minimum time between two attacks
    pub time_between_uses: f32,
    /// Releasing the trigger during the cooldown stops the weapon early
    pub time_between_uses_release_interruption: bool,

    // === Burst ===
    pub use_burst_mode: bool,
    pub burst_length: u32,
    pub burst_time_between_shots: f32,

    // === Ammo ===
    pub magazine_based: bool,
    pub magazine_size: u32,
    pub ammo_consumed_per_shot: u32,
    /// Start a reload instead of entering ReloadNeeded on an empty magazine
    pub auto_reload: bool,
    pub reload_time: f32,
    /// Draw from this pool in the owner's inventory instead of a local magazine
    pub ammo_pool: Option<AmmoId>,
    /// Refuse to reload when the pool's reserve is empty
    pub prevent_reload_if_ammo_empty: bool,

    // === Handling ===
    pub interruptable: bool,
    /// Impulse applied opposite the facing on every use
    pub recoil_force: f32,
    /// Owner speed multiplier while the weapon is active
    pub movement_multiplier_while_in_use: f32,
    pub prevent_movement_while_in_use: bool,

    // === Payload ===
    // Consumed by hit resolution, not by the state machine.
    pub damage: f32,
    pub range: f32,
    pub knockback_force: f32,
    pub typed_damage: Vec<TypedDamage>,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            trigger_mode: TriggerMode::SemiAuto,
            delay_before_use: 0.0,
            delay_before_use_release_interruption: false,
            time_between_uses: 1.0,
            time_between_uses_release_interruption: true,
            use_burst_mode: false,
            burst_length: 3,
            burst_time_between_shots: 0.1,
            magazine_based: false,
            magazine_size: 30,
            ammo_consumed_per_shot: 1,
            auto_reload: false,
            reload_time: 2.0,
            ammo_pool: None,
            prevent_reload_if_ammo_empty: false,
            interruptable: false,
            recoil_force: 0.0,
            movement_multiplier_while_in_use: 1.0,
            prevent_movement_while_in_use: false,
            damage: 10.0,
            range: 10.0,
            knockback_force: 0.0,
            typed_damage: Vec::new(),
        }
    }
}

impl WeaponConfig {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Multiplier to apply to the owner's speed while active, if any.
    pub fn active_speed_multiplier(&self) -> Option<f32> {
        if self.prevent_movement_while_in_use {
            Some(0.0)
        } else if self.movement_multiplier_while_in_use != 1.0 {
            Some(self.movement_multiplier_while_in_use)
        } else {
            None
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        let timings = [
            ("delay_before_use", self.delay_before_use),
            ("time_between_uses", self.time_between_uses),
            ("burst_time_between_shots", self.burst_time_between_shots),
            ("reload_time", self.reload_time),
        ];
        for (field, value) in timings {
            if value < 0.0 {
                return Err(format!("{}: {} must not be negative ({})", self.name, field, value));
            }
        }
        if self.use_burst_mode && self.burst_length == 0 {
            return Err(format!("{}: burst_length must be at least 1", self.name));
        }
        if self.magazine_based && self.magazine_size == 0 {
            return Err(format!("{}: magazine_size must be positive", self.name));
        }
        if self.movement_multiplier_while_in_use < 0.0 {
            return Err(format!("{}: movement multiplier must not be negative", self.name));
        }
        Ok(())
    }
}

/// Root structure for the weapons.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct WeaponsFile {
    pub weapons: HashMap<String, WeaponConfig>,
}

/// Resource containing all weapon definitions, keyed by name.
#[derive(Resource, Debug, Clone, Default)]
pub struct WeaponDefinitions {
    definitions: HashMap<String, WeaponConfig>,
}

impl WeaponDefinitions {
    pub fn new(file: WeaponsFile) -> Self {
        let definitions = file
            .weapons
            .into_iter()
            .map(|(name, mut config)| {
                if config.name.is_empty() {
                    config.name = name.clone();
                }
                (name, config)
            })
            .collect();
        Self { definitions }
    }

    pub fn from_ron(contents: &str, origin: &str) -> Result<Self> {
        let file: WeaponsFile = ron::from_str(contents).map_err(|source| ConfigError::Ron {
            path: origin.to_string(),
            source,
        })?;
        let definitions = Self::new(file);
        definitions.validate()?;
        Ok(definitions)
    }

    pub fn insert(&mut self, config: WeaponConfig) {
        self.definitions.insert(config.name.clone(), config);
    }

    pub fn get(&self, name: &str) -> Option<&WeaponConfig> {
        self.definitions.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&WeaponConfig> {
        self.get(name)
            .ok_or_else(|| ConfigError::MissingWeapon(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn validate(&self) -> Result<()> {
        for config in self.definitions.values() {
            config.validate().map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }
}

/// Load weapon definitions from a RON file
pub fn load_weapon_definitions(path: &Path) -> Result<WeaponDefinitions> {
    let origin = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: origin.clone(),
        source,
    })?;
    let definitions = WeaponDefinitions::from_ron(&contents, &origin)?;
    info!("Loaded {} weapon definitions from {}", definitions.len(), origin);
    Ok(definitions)
}
