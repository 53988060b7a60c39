//! Weapons
//!
//! A `Weapon` is one equipped weapon instance: its configuration, its state
//! machine, its countdowns and its ammo source. It is driven by the
//! handle-weapon module that owns it:
//! - commands (`input_start`, `input_stop`, `turn_on`, `force_stop`,
//!   `interrupt`, `initiate_reload`) are guarded and silently ignored when
//!   their preconditions fail
//! - `process` advances the machine by one tick
//!
//! Everything outside the weapon that it touches (owner clock, controller,
//! ammo inventory, speed modifiers, feedback, events) arrives through a
//! `WeaponEnv` borrowed from the owner for the duration of the call.

pub mod ammo;
pub mod buffer;
pub mod config;
pub mod equipment;
pub mod state_machine;

use bevy::prelude::*;

use crate::character::controller::Controller;
use crate::character::modifiers::{ModifierSource, SpeedModifiers};
use crate::character::ActorId;
use crate::combat::events::{ActorEvent, EventBus};
use crate::feedback::{FeedbackCue, FeedbackSink};
use crate::state_machine::StateMachine;

pub use ammo::{AmmoDisplay, AmmoId, AmmoInventory, AmmoPool, AmmoSource};
pub use buffer::{BufferPoll, InputBuffer};
pub use config::{
    load_weapon_definitions, TriggerMode, WeaponConfig, WeaponDefinitions, DEFAULT_WEAPONS_PATH,
};
pub use equipment::Equipment;
pub use state_machine::WeaponState;

/// Transitions kept per weapon for observation.
pub const WEAPON_HISTORY_CAPACITY: usize = 64;

/// The owner-side data a weapon may touch during one call.
pub struct WeaponEnv<'a> {
    pub owner: ActorId,
    /// Handle-weapon slot the weapon sits in
    pub slot: usize,
    /// Owner clock
    pub now: f32,
    /// Length of the current tick
    pub delta: f32,
    pub controller: &'a mut Controller,
    pub ammo: &'a mut AmmoInventory,
    pub speed_modifiers: &'a mut SpeedModifiers,
    pub feedback: &'a mut dyn FeedbackSink,
    pub events: &'a mut EventBus,
}

impl WeaponEnv<'_> {
    pub fn play(&mut self, cue: FeedbackCue) {
        self.feedback.play(self.owner, cue);
    }
}

/// Remaining shots of a burst that started with one fire request.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BurstProgress {
    remaining: u32,
    next_shot_at: f32,
}

#[derive(Debug, Clone)]
pub struct Weapon {
    config: WeaponConfig,
    state: StateMachine<WeaponState>,
    ammo: AmmoSource,
    trigger_released: bool,
    reloading: bool,
    /// While false, `turn_on` is rate-limited to once per `time_between_uses`
    input_authorized: bool,
    delay_before_use_counter: f32,
    delay_between_uses_counter: f32,
    reload_counter: f32,
    last_turn_on_at: f32,
    last_shoot_request_at: f32,
    burst: Option<BurstProgress>,
}

impl Weapon {
    /// Build a weapon for an owner holding `inventory`. A pool reference the
    /// inventory cannot satisfy falls back to a local magazine.
    pub fn new(config: WeaponConfig, inventory: &AmmoInventory) -> Self {
        let ammo = match &config.ammo_pool {
            Some(id) if inventory.contains(id) => AmmoSource::Pool(id.clone()),
            Some(id) => {
                warn!(
                    "Weapon '{}' references missing ammo pool '{}', using local counter",
                    config.name, id.0
                );
                Self::local_source(&config)
            }
            None => Self::local_source(&config),
        };
        Self {
            config,
            state: StateMachine::with_history(WeaponState::Idle, WEAPON_HISTORY_CAPACITY),
            ammo,
            trigger_released: true,
            reloading: false,
            input_authorized: true,
            delay_before_use_counter: 0.0,
            delay_between_uses_counter: 0.0,
            reload_counter: 0.0,
            last_turn_on_at: f32::NEG_INFINITY,
            last_shoot_request_at: f32::NEG_INFINITY,
            burst: None,
        }
    }

    fn local_source(config: &WeaponConfig) -> AmmoSource {
        if config.magazine_based {
            AmmoSource::Magazine {
                loaded: config.magazine_size,
                size: config.magazine_size,
            }
        } else {
            AmmoSource::Unlimited
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn state(&self) -> WeaponState {
        self.state.current()
    }

    pub fn state_machine(&self) -> &StateMachine<WeaponState> {
        &self.state
    }

    pub fn ammo_source(&self) -> &AmmoSource {
        &self.ammo
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn trigger_released(&self) -> bool {
        self.trigger_released
    }

    pub fn input_authorized(&self) -> bool {
        self.input_authorized
    }

    pub fn set_input_authorized(&mut self, authorized: bool) {
        self.input_authorized = authorized;
    }

    pub fn burst_in_progress(&self) -> bool {
        self.burst.is_some()
    }

    /// Rounds in the local magazine, None when the weapon has no local counter.
    pub fn current_ammo_loaded(&self) -> Option<u32> {
        match self.ammo {
            AmmoSource::Magazine { loaded, .. } => Some(loaded),
            _ => None,
        }
    }

    pub fn ammo_display(&self, inventory: &AmmoInventory) -> AmmoDisplay {
        let mut display = AmmoDisplay {
            magazine_based: self.config.magazine_based,
            reloading: self.reloading,
            ..Default::default()
        };
        match &self.ammo {
            AmmoSource::Unlimited => display.unlimited = true,
            AmmoSource::Magazine { loaded, size } => {
                display.current = *loaded;
                display.maximum = *size;
            }
            AmmoSource::Pool(id) => {
                if let Some(pool) = inventory.get(id) {
                    display.current = pool.available(self.config.magazine_based);
                    display.maximum = pool.magazine_size;
                    display.reserve = Some(pool.reserve);
                }
            }
        }
        display
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Trigger pressed. Turns the weapon on from Idle; ignored while reloading.
    /// Returns true if the weapon turned on.
    pub fn input_start(&mut self, env: &mut WeaponEnv) -> bool {
        if self.reloading {
            return false;
        }
        if self.state.is(WeaponState::Idle) {
            self.trigger_released = false;
            return self.turn_on(env);
        }
        false
    }

    /// Trigger released.
    pub fn input_stop(&mut self) {
        self.trigger_released = true;
    }

    /// Idle -> Start.
    pub fn turn_on(&mut self, env: &mut WeaponEnv) -> bool {
        if self.reloading || !self.state.is(WeaponState::Idle) {
            return false;
        }
        if !self.input_authorized && env.now - self.last_turn_on_at < self.config.time_between_uses {
            debug!("{}: turn on rate-limited", self.config.name);
            return false;
        }
        self.last_turn_on_at = env.now;
        env.play(FeedbackCue::WeaponStart);
        if let Some(multiplier) = self.config.active_speed_multiplier() {
            env.speed_modifiers.set(ModifierSource::Weapon(env.slot), multiplier);
        }
        self.change_state(WeaponState::Start);
        true
    }

    /// Stop an active weapon. Ignored when idle, stopping, interrupted or reloading.
    pub fn force_stop(&mut self, env: &mut WeaponEnv) {
        let state = self.state.current();
        if matches!(state, WeaponState::Idle | WeaponState::Stop | WeaponState::Interrupted)
            || state.is_reload()
        {
            return;
        }
        self.stop_effects(env);
        self.change_state(WeaponState::Stop);
    }

    /// Cancel whatever the weapon is doing. Requires `interruptable`; reloads
    /// are never interrupted.
    pub fn interrupt(&mut self) -> bool {
        let state = self.state.current();
        if !self.config.interruptable
            || self.reloading
            || state.is_reload()
            || state == WeaponState::Interrupted
        {
            return false;
        }
        self.burst = None;
        self.change_state(WeaponState::Interrupted);
        true
    }

    /// Begin a reload. Returns true if the reload started.
    pub fn initiate_reload(&mut self, env: &mut WeaponEnv) -> bool {
        if self.reloading || !self.config.magazine_based {
            return false;
        }
        if let AmmoSource::Pool(id) = &self.ammo {
            let exhausted = env.ammo.get(id).map_or(true, AmmoPool::is_exhausted);
            if exhausted && self.config.prevent_reload_if_ammo_empty {
                env.play(FeedbackCue::ReloadImpossible);
                return false;
            }
        }
        self.burst = None;
        self.change_state(WeaponState::ReloadStart);
        self.reloading = true;
        true
    }

    /// Back to Idle with no transition, no cues and no pending work.
    pub fn reset(&mut self, env: &mut WeaponEnv) {
        self.state.reset(WeaponState::Idle);
        self.reloading = false;
        self.trigger_released = true;
        self.burst = None;
        self.delay_before_use_counter = 0.0;
        self.delay_between_uses_counter = 0.0;
        self.reload_counter = 0.0;
        env.speed_modifiers.remove(&ModifierSource::Weapon(env.slot));
    }

    // ========================================================================
    // Per-tick processing
    // ========================================================================

    /// Advance the state machine by one tick.
    pub fn process(&mut self, env: &mut WeaponEnv) {
        match self.state.current() {
            WeaponState::Idle => {
                env.speed_modifiers.remove(&ModifierSource::Weapon(env.slot));
            }
            WeaponState::Start => {
                if self.config.delay_before_use > 0.0 {
                    self.delay_before_use_counter = self.config.delay_before_use;
                    self.change_state(WeaponState::DelayBeforeUse);
                } else {
                    self.shoot_request_sequence(env);
                }
            }
            WeaponState::DelayBeforeUse => {
                if self.trigger_released && self.config.delay_before_use_release_interruption {
                    self.force_stop(env);
                } else {
                    self.delay_before_use_counter -= env.delta;
                    if self.delay_before_use_counter <= 0.0 {
                        self.shoot_request_sequence(env);
                    }
                }
            }
            WeaponState::Use => {
                self.delay_between_uses_counter = self.config.time_between_uses;
                self.change_state(WeaponState::DelayBetweenUses);
            }
            WeaponState::DelayBetweenUses => {
                if self.trigger_released && self.config.time_between_uses_release_interruption {
                    self.force_stop(env);
                } else if self.burst.is_none() {
                    self.delay_between_uses_counter -= env.delta;
                    if self.delay_between_uses_counter <= 0.0 {
                        if self.config.trigger_mode == TriggerMode::Auto && !self.trigger_released {
                            self.shoot_request_sequence(env);
                        } else {
                            self.force_stop(env);
                        }
                    }
                }
            }
            WeaponState::Stop | WeaponState::ReloadNeeded => {
                self.change_state(WeaponState::Idle);
            }
            WeaponState::ReloadStart => {
                env.play(FeedbackCue::Reload);
                self.reload_counter = self.config.reload_time;
                self.change_state(WeaponState::Reload);
            }
            WeaponState::Reload => {
                self.reload_counter -= env.delta;
                if self.reload_counter <= 0.0 {
                    self.change_state(WeaponState::ReloadStop);
                }
            }
            WeaponState::ReloadStop => {
                self.finish_reload(env);
                self.change_state(WeaponState::Idle);
            }
            WeaponState::Interrupted => {
                self.stop_effects(env);
                self.change_state(WeaponState::Idle);
            }
        }
        self.continue_burst(env);
    }

    fn continue_burst(&mut self, env: &mut WeaponEnv) {
        let Some(mut burst) = self.burst else {
            return;
        };
        match self.state.current() {
            WeaponState::Use => {}
            WeaponState::DelayBetweenUses => {
                if env.now >= burst.next_shot_at {
                    burst.remaining -= 1;
                    burst.next_shot_at += self.config.burst_time_between_shots;
                    self.burst = (burst.remaining > 0).then_some(burst);
                    self.shoot_request(env);
                }
            }
            _ => self.burst = None,
        }
    }

    /// One fire request, expanded into a burst when configured. Requests
    /// closer together than `time_between_uses` are dropped.
    fn shoot_request_sequence(&mut self, env: &mut WeaponEnv) {
        if env.now - self.last_shoot_request_at < self.config.time_between_uses {
            return;
        }
        self.last_shoot_request_at = env.now;
        if self.config.use_burst_mode && self.config.burst_length > 1 {
            self.burst = Some(BurstProgress {
                remaining: self.config.burst_length - 1,
                next_shot_at: env.now + self.config.burst_time_between_shots,
            });
        }
        self.shoot_request(env);
    }

    /// Check ammo and either fire, reload, or flag a reload as needed.
    fn shoot_request(&mut self, env: &mut WeaponEnv) {
        if self.reloading {
            return;
        }
        if self.try_consume_ammo(env.ammo) {
            self.weapon_use(env);
            return;
        }
        self.burst = None;
        if !self.config.magazine_based {
            self.force_stop(env);
        } else if !(self.config.auto_reload && self.initiate_reload(env)) {
            self.change_state(WeaponState::ReloadNeeded);
            env.play(FeedbackCue::ReloadNeeded);
        }
    }

    fn try_consume_ammo(&mut self, inventory: &mut AmmoInventory) -> bool {
        let per_shot = self.config.ammo_consumed_per_shot;
        let magazine_based = self.config.magazine_based;
        match &mut self.ammo {
            AmmoSource::Unlimited => true,
            AmmoSource::Magazine { loaded, .. } => {
                if *loaded < per_shot {
                    return false;
                }
                *loaded -= per_shot;
                true
            }
            AmmoSource::Pool(id) => inventory
                .get_mut(id)
                .is_some_and(|pool| pool.consume(per_shot, magazine_based)),
        }
    }

    /// Entering Use: recoil, feedback and the WeaponUsed event.
    fn weapon_use(&mut self, env: &mut WeaponEnv) {
        self.change_state(WeaponState::Use);
        let direction = env.controller.facing.normalize_or_zero();
        if self.config.recoil_force > 0.0 {
            env.controller.add_impulse(-direction * self.config.recoil_force);
        }
        env.play(FeedbackCue::WeaponUse);
        env.events.emit(ActorEvent::WeaponUsed {
            actor: env.owner,
            slot: env.slot,
            weapon: self.config.name.clone(),
            origin: env.controller.position,
            direction,
        });
    }

    fn finish_reload(&mut self, env: &mut WeaponEnv) {
        self.reloading = false;
        match &mut self.ammo {
            AmmoSource::Unlimited => {}
            AmmoSource::Magazine { loaded, size } => *loaded = *size,
            AmmoSource::Pool(id) => {
                if let Some(pool) = env.ammo.get_mut(id) {
                    pool.fill_magazine();
                }
            }
        }
        env.events.emit(ActorEvent::Reloaded {
            actor: env.owner,
            weapon: self.config.name.clone(),
        });
    }

    /// Side effects of turning the weapon off.
    fn stop_effects(&mut self, env: &mut WeaponEnv) {
        self.trigger_released = true;
        self.burst = None;
        env.play(FeedbackCue::WeaponStop);
        env.speed_modifiers.remove(&ModifierSource::Weapon(env.slot));
    }

    fn change_state(&mut self, to: WeaponState) {
        let from = self.state.current();
        debug_assert!(
            WeaponState::can_transition(from, to),
            "{}: illegal weapon transition {:?} -> {:?}",
            self.config.name,
            from,
            to
        );
        if self.state.change_state(to) {
            debug!("{}: {:?} -> {:?}", self.config.name, from, to);
        }
    }
}
