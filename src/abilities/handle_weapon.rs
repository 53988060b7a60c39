//! Handle-weapon module
//!
//! Owns one equipment slot. Turns shoot/reload input into weapon commands,
//! advances the weapon every Process pass, buffers start requests made while
//! the weapon is busy, and publishes an ammo snapshot every Late pass.

use std::any::Any;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{AbilityContext, AbilityKind, CharacterAbility};
use crate::animator::AnimatorParameters;
use crate::character::authorization::{ability_authorized, AbilityBase};
use crate::character::conditions::ConditionState;
use crate::character::state::ActorState;
use crate::character::ActorId;
use crate::feedback::FeedbackCue;
use crate::input::ButtonState;
use crate::weapon::{AmmoDisplay, BufferPoll, InputBuffer, TriggerMode, WeaponConfig, WeaponState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleWeaponConfig {
    /// Equipment slot this module drives
    pub slot: usize,
    /// Keep start requests made while the weapon is busy
    pub buffer_input: bool,
    /// A new request while one is buffered refreshes its expiry
    pub new_input_extends_buffer: bool,
    pub maximum_buffer_duration: f32,
    /// Holding the trigger keeps requesting starts (Auto weapons only)
    pub continuous_press: bool,
}

impl Default for HandleWeaponConfig {
    fn default() -> Self {
        Self {
            slot: 0,
            buffer_input: false,
            new_input_extends_buffer: false,
            maximum_buffer_duration: 0.25,
            continuous_press: false,
        }
    }
}

pub struct HandleWeapon {
    base: AbilityBase,
    pub config: HandleWeaponConfig,
    initial_weapon: Option<WeaponConfig>,
    buffer: InputBuffer,
    ammo_display: AmmoDisplay,
    /// Equipment generation last seen, to notice weapon swaps
    seen_generation: u32,
    owner: Option<ActorId>,
}

impl HandleWeapon {
    pub fn new(config: HandleWeaponConfig) -> Self {
        Self {
            base: AbilityBase::default(),
            config,
            initial_weapon: None,
            buffer: InputBuffer::default(),
            ammo_display: AmmoDisplay::default(),
            seen_generation: 0,
            owner: None,
        }
    }

    /// Weapon to equip on initialization when the slot is empty.
    pub fn with_initial_weapon(mut self, weapon: WeaponConfig) -> Self {
        self.initial_weapon = Some(weapon);
        self
    }

    pub fn with_base(mut self, base: AbilityBase) -> Self {
        self.base = base;
        self
    }

    pub fn owner(&self) -> Option<ActorId> {
        self.owner
    }

    pub fn slot(&self) -> usize {
        self.config.slot
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn ammo_display(&self) -> AmmoDisplay {
        self.ammo_display
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Start shooting, or buffer the request if the weapon is busy.
    pub fn shoot_start(&mut self, state: &mut ActorState) {
        if !ability_authorized(&self.base, state)
            || state.condition.current() != ConditionState::Normal
        {
            return;
        }
        let now = state.now();
        let slot = self.config.slot;
        let Some((weapon, mut env)) = state.weapon_env(slot) else {
            return;
        };
        if self.config.buffer_input && weapon.state() != WeaponState::Idle {
            self.buffer.request(
                now,
                self.config.maximum_buffer_duration,
                self.config.new_input_extends_buffer,
            );
        }
        if weapon.input_start(&mut env) {
            env.play(FeedbackCue::AbilityStart);
            self.buffer.clear();
        }
    }

    /// Release the trigger, force-stopping where the weapon allows it.
    pub fn shoot_stop(&mut self, state: &mut ActorState) {
        let slot = self.config.slot;
        let Some((weapon, mut env)) = state.weapon_env(slot) else {
            return;
        };
        weapon.input_stop();

        let config = weapon.config();
        let keep_running = match weapon.state() {
            WeaponState::Idle
            | WeaponState::Use
            | WeaponState::Stop
            | WeaponState::ReloadNeeded
            | WeaponState::Interrupted => true,
            WeaponState::DelayBeforeUse => !config.delay_before_use_release_interruption,
            WeaponState::DelayBetweenUses => !config.time_between_uses_release_interruption,
            other => other.is_reload(),
        };
        if keep_running {
            return;
        }
        weapon.force_stop(&mut env);
        env.play(FeedbackCue::AbilityStop);
    }

    pub fn force_stop(&mut self, state: &mut ActorState) {
        if let Some((weapon, mut env)) = state.weapon_env(self.config.slot) {
            weapon.force_stop(&mut env);
        }
    }

    pub fn interrupt(&mut self, state: &mut ActorState) -> bool {
        state
            .equipment
            .get_mut(self.config.slot)
            .is_some_and(|weapon| weapon.interrupt())
    }

    pub fn reload(&mut self, state: &mut ActorState) {
        if !ability_authorized(&self.base, state) {
            return;
        }
        if let Some((weapon, mut env)) = state.weapon_env(self.config.slot) {
            weapon.initiate_reload(&mut env);
        }
    }

    /// Swap the weapon in this module's slot (None unequips).
    pub fn change_weapon(&mut self, state: &mut ActorState, weapon: Option<WeaponConfig>) {
        state.equip_weapon(self.config.slot, weapon);
        self.buffer.clear();
        self.seen_generation = state.equipment.generation(self.config.slot);
        self.refresh_ammo_display(state);
    }

    fn handle_input(&mut self, ctx: &mut AbilityContext) {
        let auto = ctx
            .state
            .equipment
            .get(self.config.slot)
            .is_some_and(|w| w.config().trigger_mode == TriggerMode::Auto);

        match ctx.input.shoot {
            ButtonState::Down => self.shoot_start(ctx.state),
            ButtonState::Pressed if self.config.continuous_press && auto => {
                self.shoot_start(ctx.state)
            }
            ButtonState::Up => self.shoot_stop(ctx.state),
            _ => {}
        }
        if ctx.input.reload == ButtonState::Down {
            self.reload(ctx.state);
        }
    }

    /// Fire a due buffered request. A press released before it fired
    /// acts as a tap.
    fn poll_buffer(&mut self, state: &mut ActorState, held: bool) {
        let idle = state
            .equipment
            .get(self.config.slot)
            .is_some_and(|w| w.state() == WeaponState::Idle);
        match self.buffer.poll(state.now(), idle) {
            BufferPoll::Fire => {
                debug!("{}: firing buffered request", state.name);
                self.shoot_start(state);
                if !held {
                    if let Some(weapon) = state.equipment.get_mut(self.config.slot) {
                        weapon.input_stop();
                    }
                }
            }
            BufferPoll::Expired => debug!("{}: buffered request expired", state.name),
            BufferPoll::Empty | BufferPoll::Waiting => {}
        }
    }

    /// Drop the buffer if another module swapped our weapon.
    fn sync_generation(&mut self, state: &ActorState) {
        let generation = state.equipment.generation(self.config.slot);
        if generation != self.seen_generation {
            self.seen_generation = generation;
            self.buffer.clear();
        }
    }

    fn refresh_ammo_display(&mut self, state: &ActorState) {
        self.ammo_display = state
            .equipment
            .get(self.config.slot)
            .map(|w| w.ammo_display(&state.ammo))
            .unwrap_or_default();
    }
}

impl CharacterAbility for HandleWeapon {
    fn kind(&self) -> AbilityKind {
        AbilityKind::HandleWeapon
    }

    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn pre_initialize(&mut self, owner: ActorId) {
        self.owner = Some(owner);
    }

    fn initialize(&mut self, state: &mut ActorState) {
        if state.equipment.get(self.config.slot).is_none() {
            if let Some(weapon) = self.initial_weapon.clone() {
                state.equip_weapon(self.config.slot, Some(weapon));
            }
        }
        self.seen_generation = state.equipment.generation(self.config.slot);
        self.buffer.clear();
        self.refresh_ammo_display(state);
    }

    fn early_process(&mut self, ctx: &mut AbilityContext) {
        self.sync_generation(ctx.state);
        self.handle_input(ctx);
    }

    fn process(&mut self, ctx: &mut AbilityContext) {
        self.sync_generation(ctx.state);
        if let Some((weapon, mut env)) = ctx.state.weapon_env(self.config.slot) {
            weapon.process(&mut env);
        }
        self.poll_buffer(ctx.state, ctx.input.shoot.is_held());
    }

    fn blocked_process(&mut self, ctx: &mut AbilityContext) {
        self.sync_generation(ctx.state);
        if let Some((weapon, mut env)) = ctx.state.weapon_env(self.config.slot) {
            // Stops, interrupts and reloads still run out while commands are gated
            let state = weapon.state();
            if state != WeaponState::Idle && !state.is_firing() {
                weapon.process(&mut env);
            }
        }
    }

    fn late_process(&mut self, ctx: &mut AbilityContext) {
        self.refresh_ammo_display(ctx.state);
    }

    fn update_animator(&self, state: &ActorState, animator: &mut AnimatorParameters) {
        let current = state.equipment.get(self.config.slot).map(|w| w.state());
        for weapon_state in WeaponState::ALL {
            animator.set_bool(weapon_state.animator_parameter(), current == Some(weapon_state));
        }
        animator.set_float("Ammo", self.ammo_display.current as f32);
    }

    fn on_authorization_lost(&mut self, state: &mut ActorState) {
        self.force_stop(state);
        self.buffer.clear();
    }

    fn reset_ability(&mut self, state: &mut ActorState) {
        if let Some((weapon, mut env)) = state.weapon_env(self.config.slot) {
            weapon.reset(&mut env);
        }
        self.buffer.clear();
        self.refresh_ammo_display(state);
    }

    fn teardown(&mut self, state: &mut ActorState) {
        self.change_weapon(state, None);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
