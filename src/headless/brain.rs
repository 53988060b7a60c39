//! AI decision layer
//!
//! Each AI-driven actor has a `ShooterBrain`. Every frame the brain gets a
//! read-only snapshot of its actor and target and returns an `InputState`,
//! exactly what a human provider would produce. The core cannot tell them apart.

use std::collections::HashMap;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::BrainConfig;
use crate::character::ActorId;
use crate::combat::PendingInputs;
use crate::input::{ButtonTracker, InputState};
use crate::weapon::TriggerMode;
use crate::world::ActorWorld;

/// Seedable RNG shared by every brain.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }
}

/// What a brain knows about the world this frame.
#[derive(Debug, Clone, Copy)]
pub struct BrainSnapshot {
    pub position: Vec2,
    pub alive: bool,
    pub weapon_range: Option<f32>,
    /// Loaded rounds, when the weapon counts them
    pub loaded: Option<u32>,
    pub reloading: bool,
    /// Holding the trigger keeps firing
    pub automatic: bool,
    pub target: Option<Vec2>,
}

impl BrainSnapshot {
    pub fn capture(world: &ActorWorld, id: ActorId, slot: usize) -> Option<Self> {
        let state = world.actor(id)?.state();
        let weapon = state.equipment.get(slot);
        let target = world
            .nearest_enemy(id)
            .and_then(|enemy| world.actor(enemy))
            .map(|enemy| enemy.state().controller.position);
        Some(Self {
            position: state.controller.position,
            alive: state.is_alive(),
            weapon_range: weapon.map(|w| w.config().range),
            loaded: weapon.and_then(|w| {
                let display = w.ammo_display(&state.ammo);
                (display.magazine_based && !display.unlimited).then_some(display.current)
            }),
            reloading: weapon.is_some_and(|w| w.is_reloading()),
            automatic: weapon.is_some_and(|w| w.config().trigger_mode == TriggerMode::Auto),
            target,
        })
    }
}

/// Walks into range of the nearest enemy, aims at it and holds the trigger.
#[derive(Debug, Clone)]
pub struct ShooterBrain {
    pub config: BrainConfig,
    pub slot: usize,
    buttons: ButtonTracker,
    trigger_held: bool,
}

impl ShooterBrain {
    pub fn new(config: BrainConfig, slot: usize) -> Self {
        Self {
            config,
            slot,
            buttons: ButtonTracker::default(),
            trigger_held: false,
        }
    }

    pub fn decide(&mut self, snapshot: &BrainSnapshot, rng: &mut GameRng) -> InputState {
        let (Some(target), true) = (snapshot.target, snapshot.alive) else {
            return self.release();
        };

        let offset = target - snapshot.position;
        let distance = offset.length();
        let toward = offset.normalize_or_zero();

        let spread = self.config.aim_spread;
        let aim = Vec2::from_angle(rng.random_range(-spread, spread)).rotate(toward);

        let preferred = self.config.preferred_range;
        let movement = if distance > preferred {
            toward
        } else if distance < preferred * 0.5 {
            -toward
        } else {
            Vec2::ZERO
        };

        let in_range = snapshot.weapon_range.is_some_and(|range| distance <= range);
        let empty = snapshot.loaded == Some(0);
        let wants_to_fire = in_range && !empty && !snapshot.reloading;
        // Semi-automatic weapons need a fresh press per shot
        let shoot = wants_to_fire && (snapshot.automatic || !self.trigger_held);
        let reload = empty && !snapshot.reloading;
        self.trigger_held = shoot;

        let (shoot, reload, switch_weapon) = self.buttons.update(shoot, reload, false);
        InputState {
            movement,
            aim: Some(aim),
            shoot,
            reload,
            switch_weapon,
        }
    }

    fn release(&mut self) -> InputState {
        self.trigger_held = false;
        let (shoot, reload, switch_weapon) = self.buttons.update(false, false, false);
        InputState {
            shoot,
            reload,
            switch_weapon,
            ..Default::default()
        }
    }
}

/// Brains by actor.
#[derive(Resource, Default, Debug)]
pub struct Brains(pub HashMap<ActorId, ShooterBrain>);

/// Decide phase: snapshot every brain's view first, then decide.
pub fn decide_brain_inputs(
    world: Res<ActorWorld>,
    mut brains: ResMut<Brains>,
    mut rng: ResMut<GameRng>,
    mut inputs: ResMut<PendingInputs>,
) {
    let mut snapshots: Vec<(ActorId, BrainSnapshot)> = brains
        .0
        .iter()
        .filter_map(|(id, brain)| Some((*id, BrainSnapshot::capture(&world, *id, brain.slot)?)))
        .collect();
    // Fixed order so a seeded RNG replays identically
    snapshots.sort_by_key(|(id, _)| *id);

    for (id, snapshot) in snapshots {
        if let Some(brain) = brains.0.get_mut(&id) {
            let input = brain.decide(&snapshot, &mut rng);
            inputs.0.insert(id, input);
        }
    }
}
