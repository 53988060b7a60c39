//! actionsim - headless runner
//!
//! Loads weapon definitions and a scenario, applies command-line overrides and
//! runs the match to completion.

use std::process::ExitCode;

use actionsim::cli::{parse_args, Args};
use actionsim::error::Result;
use actionsim::headless::{run_headless_match, ScenarioConfig};
use actionsim::weapon::load_weapon_definitions;

fn run(args: Args) -> Result<()> {
    let weapons = load_weapon_definitions(&args.weapons)?;
    let mut scenario = ScenarioConfig::load_from_file(&args.scenario)?;

    if let Some(output) = args.output {
        scenario.output_path = Some(output.display().to_string());
    }
    if let Some(max_duration) = args.max_duration {
        scenario.max_duration_secs = max_duration;
    }
    if args.seed.is_some() {
        scenario.random_seed = args.seed;
    }

    run_headless_match(scenario, weapons, &args.log_filter)
}

fn main() -> ExitCode {
    match run(parse_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
