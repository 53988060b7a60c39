//! Command-line interface for actionsim
//!
//! Runs one headless scenario. Flags override the matching scenario fields.

use clap::Parser;
use std::path::PathBuf;

use crate::weapon::DEFAULT_WEAPONS_PATH;

/// Real-time action simulation runner
#[derive(Parser, Debug)]
#[command(name = "actionsim")]
#[command(about = "Run an AI-driven action scenario headlessly")]
#[command(version)]
pub struct Args {
    /// Scenario JSON file
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub scenario: PathBuf,

    /// Weapon definitions (RON)
    #[arg(long, value_name = "WEAPONS_FILE", default_value = DEFAULT_WEAPONS_PATH)]
    pub weapons: PathBuf,

    /// Output path for the combat log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum match duration in seconds
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Random seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter, e.g. "info" or "actionsim=debug"
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["actionsim", "--scenario", "duel.json"]).unwrap();
        assert_eq!(args.weapons, PathBuf::from(DEFAULT_WEAPONS_PATH));
        assert_eq!(args.log_filter, "info");
        assert!(args.seed.is_none());
    }

    #[test]
    fn test_scenario_is_required() {
        assert!(Args::try_parse_from(["actionsim"]).is_err());
    }
}
