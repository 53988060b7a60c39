//! Headless mode for automated testing
//!
//! Runs AI-driven scenarios without any graphical output: every actor gets a
//! `ShooterBrain` as its decision layer, weapon uses are resolved as hitscan
//! damage, and the combat log is optionally saved as JSON.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --scenario assets/scenarios/duel.json --seed 7
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "actors": [
//!     { "name": "Red", "team": 1, "position": [-8.0, 0.0], "weapons": ["Rifle"] },
//!     { "name": "Blue", "team": 2, "position": [8.0, 0.0], "weapons": ["Pistol"] }
//!   ],
//!   "max_duration_secs": 120
//! }
//! ```

pub mod brain;
pub mod config;
pub mod runner;

pub use brain::{BrainSnapshot, Brains, GameRng, ShooterBrain};
pub use config::{ActorSpec, BrainConfig, ScenarioConfig};
pub use runner::{
    build_headless_app, run_headless_match, step_until_complete, ActorResult, HeadlessMatchState,
    HeadlessPlugin, MatchResult,
};
