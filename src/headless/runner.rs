//! Scenario runner
//!
//! Runs a scenario without any graphical output, suitable for automated
//! testing. AI brains drive every actor, weapon uses become hitscan damage,
//! and the match ends when one team is left standing or time runs out.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use super::brain::{decide_brain_inputs, Brains, GameRng, ShooterBrain};
use super::config::ScenarioConfig;
use crate::abilities::{CharacterMovement, CharacterOrientation, CharacterSwitchWeapon, HandleWeapon};
use crate::character::resistance::DamageRequest;
use crate::character::{Actor, ActorId};
use crate::combat::events::ActorEvent;
use crate::combat::log::{ActorMetadata, CombatLog, CombatLogEventType, MatchMetadata};
use crate::combat::{ActionCorePlugin, ActionPhase};
use crate::error::Result;
use crate::weapon::WeaponDefinitions;
use crate::world::ActorWorld;

/// Fixed simulation step used by headless runs.
pub const HEADLESS_TIMESTEP: f64 = 1.0 / 60.0;

/// How far from a shot's line an actor can stand and still be hit.
pub const HIT_RADIUS: f32 = 0.5;

/// Outcome of one scenario run
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// The winning team, or None for a draw
    pub winner: Option<u8>,
    pub match_time: f32,
    pub actors: Vec<ActorResult>,
    /// Seed the brains drew from, if the run is reproducible
    pub random_seed: Option<u64>,
}

/// Per-actor totals at the end of a run
#[derive(Debug, Clone)]
pub struct ActorResult {
    pub name: String,
    pub team: u8,
    pub max_health: f32,
    /// Read through the master link for linked actors
    pub final_health: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub shots_fired: usize,
}

/// Progress of the running scenario.
#[derive(Resource, Debug)]
pub struct HeadlessMatchState {
    /// Timeout in seconds; reaching it is a draw
    pub max_duration: f32,
    pub elapsed_time: f32,
    /// Custom output path for the combat log (None = no file written)
    pub output_path: Option<String>,
    pub match_complete: bool,
    pub random_seed: Option<u64>,
    /// Set once, when the match ends
    pub result: Option<MatchResult>,
}

/// Spawns the scenario, drives its brains and decides when it ends.
pub struct HeadlessPlugin {
    pub config: ScenarioConfig,
    pub weapons: WeaponDefinitions,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let rng = match self.config.random_seed {
            Some(seed) => {
                info!("Brains seeded with {}", seed);
                GameRng::from_seed(seed)
            }
            None => {
                info!("No seed given, brains use entropy");
                GameRng::from_entropy()
            }
        };

        app.insert_resource(self.config.clone())
            .insert_resource(self.weapons.clone())
            .insert_resource(rng)
            .insert_resource(HeadlessMatchState {
                max_duration: self.config.max_duration_secs,
                elapsed_time: 0.0,
                output_path: self.config.output_path.clone(),
                match_complete: false,
                random_seed: self.config.random_seed,
                result: None,
            })
            .init_resource::<Brains>()
            .add_systems(Startup, headless_setup_match)
            .add_systems(Update, decide_brain_inputs.in_set(ActionPhase::Decide))
            .add_systems(Update, resolve_weapon_hits.in_set(ActionPhase::Resolve))
            .add_systems(
                Update,
                (headless_track_time, headless_check_match_end)
                    .chain()
                    .after(ActionPhase::Report),
            )
            .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

/// Spawn every scenario actor with its modules and brain
fn headless_setup_match(
    config: Res<ScenarioConfig>,
    weapons: Res<WeaponDefinitions>,
    mut world: ResMut<ActorWorld>,
    mut brains: ResMut<Brains>,
    mut combat_log: ResMut<CombatLog>,
) {
    combat_log.clear();
    combat_log.log(
        CombatLogEventType::MatchEvent,
        "Match started".to_string(),
    );

    for spec in &config.actors {
        let loadout: Vec<_> = spec
            .weapons
            .iter()
            .filter_map(|name| weapons.get(name).cloned())
            .collect();
        let slot = spec.handle_weapon.slot;

        let id = world.spawn_with(|id| {
            let mut actor = Actor::with_defaults(id, spec.to_actor_config())
                .with_ability(CharacterOrientation::new())
                .with_ability(CharacterMovement::new(spec.walk_speed));
            let mut handle = HandleWeapon::new(spec.handle_weapon.clone());
            if let Some(first) = loadout.first() {
                handle = handle.with_initial_weapon(first.clone());
            }
            actor.add_ability(Box::new(handle));
            if loadout.len() > 1 {
                actor.add_ability(Box::new(CharacterSwitchWeapon::new(slot, loadout.clone())));
            }
            actor
        });
        brains.0.insert(id, ShooterBrain::new(spec.brain.clone(), slot));
    }

    info!(
        "Headless match setup complete: {} actors on {} teams",
        world.len(),
        world.living_teams().len()
    );
}

/// Turn this step's weapon uses into hitscan damage on the first enemy in line
pub fn resolve_weapon_hits(mut world: ResMut<ActorWorld>, weapons: Res<WeaponDefinitions>) {
    let shots: Vec<(ActorId, String, Vec2, Vec2)> = world
        .pending_events()
        .filter_map(|event| match event {
            ActorEvent::WeaponUsed {
                actor,
                weapon,
                origin,
                direction,
                ..
            } => Some((*actor, weapon.clone(), *origin, *direction)),
            _ => None,
        })
        .collect();

    for (shooter, weapon, origin, direction) in shots {
        let Some(config) = weapons.get(&weapon) else {
            continue;
        };
        let Some(team) = world.actor(shooter).map(|a| a.state().team) else {
            continue;
        };
        let Some(target) = first_in_line(&world, team, origin, direction, config.range) else {
            continue;
        };

        let mut request = DamageRequest::new(config.damage)
            .from_instigator(shooter)
            .with_source(&weapon)
            .with_knockback(direction, config.knockback_force);
        for typed in &config.typed_damage {
            request = request.with_typed(typed.clone());
        }
        world.damage(target, request);
    }
}

/// Closest living actor not on `team` within `HIT_RADIUS` of the ray.
fn first_in_line(world: &ActorWorld, team: u8, origin: Vec2, direction: Vec2, range: f32) -> Option<ActorId> {
    if direction == Vec2::ZERO {
        return None;
    }
    world
        .iter()
        .filter(|a| a.state().team != team && a.state().is_alive())
        .filter_map(|a| {
            let offset = a.state().controller.position - origin;
            let along = offset.dot(direction);
            let across = offset.perp_dot(direction).abs();
            (along >= 0.0 && along <= range && across <= HIT_RADIUS).then_some((a.id(), along))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

fn headless_track_time(world: Res<ActorWorld>, mut headless_state: ResMut<HeadlessMatchState>) {
    headless_state.elapsed_time = world.elapsed();
}

/// A match ends when at most one team has living actors, or on timeout.
fn headless_check_match_end(
    world: Res<ActorWorld>,
    mut combat_log: ResMut<CombatLog>,
    mut headless_state: ResMut<HeadlessMatchState>,
) {
    if headless_state.match_complete {
        return;
    }

    let living = world.living_teams();
    let timed_out = headless_state.elapsed_time >= headless_state.max_duration;
    if living.len() > 1 && !timed_out {
        return;
    }

    let winner = if living.len() == 1 {
        living.first().copied()
    } else {
        None
    };
    match (winner, timed_out) {
        (Some(team), _) => info!("Match ended! Team {} wins!", team),
        (None, true) => info!(
            "Match timed out after {:.1}s - declaring DRAW",
            headless_state.elapsed_time
        ),
        (None, false) => info!("Match ended in a DRAW (every team eliminated)!"),
    }
    combat_log.log(
        CombatLogEventType::MatchEvent,
        format!("Match ended after {:.1}s", headless_state.elapsed_time),
    );

    let result = build_match_result(&world, &combat_log, winner, &headless_state);
    if let Some(path) = headless_state.output_path.clone() {
        let metadata = build_match_metadata(&world, &result);
        match combat_log.save_to_file(&metadata, Some(&path)) {
            Ok(filename) => println!("Match complete. Log saved to: {}", filename),
            Err(e) => eprintln!("Failed to save combat log: {}", e),
        }
    }
    headless_state.result = Some(result);
    headless_state.match_complete = true;
}

fn build_match_result(
    world: &ActorWorld,
    combat_log: &CombatLog,
    winner: Option<u8>,
    headless_state: &HeadlessMatchState,
) -> MatchResult {
    let dealt = combat_log.damage_by_instigator();
    let actors = world
        .iter()
        .map(|actor| {
            let state = actor.state();
            let (final_health, max_health) = world
                .health_of(actor.id())
                .unwrap_or((state.health.current(), state.health.maximum()));
            ActorResult {
                name: state.name.clone(),
                team: state.team,
                max_health,
                final_health,
                survived: state.is_alive(),
                damage_dealt: dealt.get(&state.name).copied().unwrap_or(0.0),
                damage_taken: combat_log.damage_taken(&state.name),
                shots_fired: combat_log.shots_fired(&state.name),
            }
        })
        .collect();

    MatchResult {
        winner,
        match_time: headless_state.elapsed_time,
        actors,
        random_seed: headless_state.random_seed,
    }
}

fn build_match_metadata(world: &ActorWorld, result: &MatchResult) -> MatchMetadata {
    let actors = world
        .iter()
        .zip(&result.actors)
        .map(|(actor, stats)| {
            let position = actor.state().controller.position;
            ActorMetadata {
                name: stats.name.clone(),
                team: stats.team,
                max_health: stats.max_health,
                final_health: stats.final_health,
                survived: stats.survived,
                damage_dealt: stats.damage_dealt,
                damage_taken: stats.damage_taken,
                shots_fired: stats.shots_fired,
                final_position: (position.x, position.y),
            }
        })
        .collect();
    MatchMetadata {
        winner: result.winner,
        duration_secs: result.match_time,
        random_seed: result.random_seed,
        actors,
    }
}

fn headless_exit_on_complete(headless_state: Res<HeadlessMatchState>, mut exit: EventWriter<AppExit>) {
    if headless_state.match_complete {
        exit.send(AppExit::Success);
    }
}

/// Build a headless app stepped with a fixed timestep. Tests drive it with
/// `App::update`; `run_headless_match` runs it to completion.
pub fn build_headless_app(config: ScenarioConfig, weapons: WeaponDefinitions) -> App {
    let mut app = App::new();
    add_headless_plugins(&mut app, config, weapons);
    app
}

fn add_headless_plugins(app: &mut App, config: ScenarioConfig, weapons: WeaponDefinitions) {
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            HEADLESS_TIMESTEP,
        )))
        .add_plugins(ActionCorePlugin)
        .add_plugins(HeadlessPlugin { config, weapons });
}

/// Step `app` until the match completes or `max_updates` frames have run.
pub fn step_until_complete(app: &mut App, max_updates: usize) -> Option<MatchResult> {
    for _ in 0..max_updates {
        app.update();
        let state = app.world().resource::<HeadlessMatchState>();
        if state.match_complete {
            return state.result.clone();
        }
    }
    None
}

/// Validate `config` and run it until the match ends.
pub fn run_headless_match(config: ScenarioConfig, weapons: WeaponDefinitions, log_filter: &str) -> Result<()> {
    config.validate(&weapons)?;

    println!("Running scenario:");
    for actor in &config.actors {
        println!("  Team {}: {} ({})", actor.team, actor.name, actor.weapons.join(", "));
    }
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    let mut app = App::new();
    app.add_plugins(LogPlugin {
        filter: log_filter.to_string(),
        ..default()
    });
    add_headless_plugins(&mut app, config, weapons);
    app.run();
    Ok(())
}
