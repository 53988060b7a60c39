//! Integration tests for headless match execution
//!
//! These tests verify that:
//! - Headless matches run to completion
//! - Match results are accessible programmatically
//! - Seeded RNG produces deterministic results
//! - The shipped weapon definitions and scenarios load and validate

use std::path::Path;

use actionsim::headless::{build_headless_app, step_until_complete, MatchResult, ScenarioConfig};
use actionsim::weapon::{
    load_weapon_definitions, TriggerMode, WeaponConfig, WeaponDefinitions, DEFAULT_WEAPONS_PATH,
};

/// Frames at 60 fps covering the longest test match, plus slack.
const MAX_UPDATES: usize = 60 * 70;

fn test_weapons() -> WeaponDefinitions {
    let mut weapons = WeaponDefinitions::default();
    weapons.insert(WeaponConfig {
        trigger_mode: TriggerMode::Auto,
        time_between_uses: 0.25,
        damage: 25.0,
        range: 10.0,
        ..WeaponConfig::named("Rifle")
    });
    weapons
}

fn duel(seed: u64, aim_spread: f32, red_health: f32) -> ScenarioConfig {
    let json = format!(
        r#"{{
            "actors": [
                {{
                    "name": "Red", "team": 1, "position": [-5.0, 0.0], "weapons": ["Rifle"],
                    "health": {{ "initial_health": {red}, "maximum_health": {red} }},
                    "brain": {{ "aim_spread": {spread} }}
                }},
                {{
                    "name": "Blue", "team": 2, "position": [5.0, 0.0], "weapons": ["Rifle"],
                    "brain": {{ "aim_spread": {spread} }}
                }}
            ],
            "max_duration_secs": 60.0,
            "random_seed": {seed}
        }}"#,
        red = red_health,
        spread = aim_spread,
        seed = seed
    );
    ScenarioConfig::from_json(&json, "inline").expect("valid scenario")
}

fn run(config: ScenarioConfig) -> MatchResult {
    let mut app = build_headless_app(config, test_weapons());
    step_until_complete(&mut app, MAX_UPDATES).expect("match completes")
}

#[test]
fn test_stronger_side_wins_duel() {
    let result = run(duel(1, 0.0, 200.0));

    assert_eq!(result.winner, Some(1));
    assert_eq!(result.random_seed, Some(1));
    let red = &result.actors[0];
    let blue = &result.actors[1];
    assert!(red.survived && !blue.survived);
    assert_eq!(blue.final_health, 0.0);
    assert!(red.damage_dealt >= 100.0, "Red dealt {}", red.damage_dealt);
    assert_eq!(blue.damage_taken, red.damage_dealt);
    assert!(red.shots_fired >= 4);
    assert!(result.match_time > 0.0 && result.match_time < 60.0);
}

#[test]
fn test_seeded_matches_are_deterministic() {
    let first = run(duel(42, 0.05, 100.0));
    let second = run(duel(42, 0.05, 100.0));

    assert_eq!(first.winner, second.winner);
    assert_eq!(first.match_time, second.match_time);
    for (a, b) in first.actors.iter().zip(&second.actors) {
        assert_eq!(a.damage_dealt, b.damage_dealt, "{} dealt different damage", a.name);
        assert_eq!(a.shots_fired, b.shots_fired);
    }
}

#[test]
fn test_timeout_is_a_draw() {
    let json = r#"{
        "actors": [
            { "name": "Red", "team": 1, "position": [-50.0, 0.0], "weapons": ["Rifle"], "walk_speed": 0.0 },
            { "name": "Blue", "team": 2, "position": [50.0, 0.0], "weapons": ["Rifle"], "walk_speed": 0.0 }
        ],
        "max_duration_secs": 0.5
    }"#;
    let config = ScenarioConfig::from_json(json, "inline").expect("valid scenario");
    let mut app = build_headless_app(config, test_weapons());

    let result = step_until_complete(&mut app, 120).expect("times out");
    assert_eq!(result.winner, None);
    assert!(result.actors.iter().all(|a| a.survived && a.shots_fired == 0));
    assert!(result.match_time >= 0.5);
}

#[test]
fn test_shipped_assets_validate() {
    let weapons = load_weapon_definitions(Path::new(DEFAULT_WEAPONS_PATH))
        .expect("weapon definitions load");
    assert!(weapons.get("Rifle").is_some());

    let scenario = ScenarioConfig::load_from_file(Path::new("assets/scenarios/duel.json"))
        .expect("scenario loads");
    scenario.validate(&weapons).expect("scenario is valid");
}
