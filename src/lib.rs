//! actionsim - real-time action/ability simulation core
//!
//! Per-actor ability modules run a three-phase tick behind an authorization
//! gate; weapons run an eleven-state firing/reload machine with buffering,
//! bursts and interrupts; health runs a typed damage pipeline with
//! resistances, timed conditions and master delegation.
//!
//! This library exposes the core modules for testing and reuse.

pub mod abilities;
pub mod animator;
pub mod character;
pub mod cli;
pub mod combat;
pub mod error;
pub mod feedback;
pub mod headless;
pub mod input;
pub mod state_machine;
pub mod weapon;
pub mod world;

// Re-export commonly used types
pub use character::{Actor, ActorConfig, ActorId};
pub use combat::log::{CombatLog, CombatLogEventType};
pub use combat::ActionCorePlugin;
pub use error::ConfigError;
pub use headless::ScenarioConfig;
pub use input::{ButtonState, InputState};
pub use weapon::{Weapon, WeaponConfig, WeaponDefinitions, WeaponState};
pub use world::ActorWorld;
