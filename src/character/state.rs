//! Shared per-actor state
//!
//! Everything an actor's ability modules read and mutate lives in
//! `ActorState`: the condition and movement machines, health, controller,
//! equipped weapons, ammo, speed modifiers, the timer list, the event bus and
//! the feedback sink. Modules only ever see it through `&mut ActorState`, so
//! changes made by an earlier module are visible to later ones in the same tick.

use bevy::prelude::*;

use super::conditions::{ConditionState, MovementState};
use super::controller::Controller;
use super::health::{DelegatedDamage, Health};
use super::modifiers::SpeedModifiers;
use super::scheduler::{ScheduledTask, Scheduler, TimerSlot};
use super::ActorId;
use crate::combat::events::{ActorEvent, EventBus};
use crate::feedback::{FeedbackCue, FeedbackSink};
use crate::state_machine::StateMachine;
use crate::weapon::{AmmoInventory, Equipment, Weapon, WeaponConfig, WeaponEnv};

/// Whether the actor takes part in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Active,
    /// Dead and waiting for a revive or respawn
    Disabled,
    /// Dead for good
    Destroyed,
}

/// Lifecycle work the orchestrator must run on the ability modules.
#[derive(Debug, Clone, Copy, Default)]
struct PendingModuleWork {
    death_reset: bool,
    reinitialize: bool,
}

pub struct ActorState {
    pub id: ActorId,
    pub name: String,
    pub team: u8,
    now: f32,
    delta: f32,
    pub condition: StateMachine<ConditionState>,
    pub movement: StateMachine<MovementState>,
    pub health: Health,
    pub controller: Controller,
    pub equipment: Equipment,
    pub ammo: AmmoInventory,
    pub speed_modifiers: SpeedModifiers,
    pub scheduler: Scheduler,
    pub events: EventBus,
    pub lifecycle: Lifecycle,
    feedback: Box<dyn FeedbackSink>,
    condition_before_freeze: Option<ConditionState>,
    temporary_condition_origin: Option<ConditionState>,
    pending: PendingModuleWork,
    delegated: Vec<DelegatedDamage>,
}

impl ActorState {
    pub fn new(
        id: ActorId,
        name: String,
        team: u8,
        controller: Controller,
        health: Health,
        feedback: Box<dyn FeedbackSink>,
    ) -> Self {
        Self {
            id,
            name,
            team,
            now: 0.0,
            delta: 0.0,
            condition: StateMachine::new(ConditionState::Normal),
            movement: StateMachine::new(MovementState::Idle),
            health,
            controller,
            equipment: Equipment::default(),
            ammo: AmmoInventory::default(),
            speed_modifiers: SpeedModifiers::default(),
            scheduler: Scheduler::default(),
            events: EventBus::default(),
            lifecycle: Lifecycle::Active,
            feedback,
            condition_before_freeze: None,
            temporary_condition_origin: None,
            pending: PendingModuleWork::default(),
            delegated: Vec::new(),
        }
    }

    /// Actor clock, advanced by each tick.
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Length of the current tick.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub(crate) fn advance_clock(&mut self, dt: f32) {
        self.delta = dt;
        self.now += dt;
    }

    pub fn is_alive(&self) -> bool {
        self.condition.current().is_alive()
    }

    pub fn play(&mut self, cue: FeedbackCue) {
        self.feedback.play(self.id, cue);
    }

    // ========================================================================
    // Weapons
    // ========================================================================

    /// Borrow the weapon in `slot` together with the owner data it may touch.
    pub fn weapon_env(&mut self, slot: usize) -> Option<(&mut Weapon, WeaponEnv<'_>)> {
        let weapon = self.equipment.get_mut(slot)?;
        let env = WeaponEnv {
            owner: self.id,
            slot,
            now: self.now,
            delta: self.delta,
            controller: &mut self.controller,
            ammo: &mut self.ammo,
            speed_modifiers: &mut self.speed_modifiers,
            feedback: self.feedback.as_mut(),
            events: &mut self.events,
        };
        Some((weapon, env))
    }

    /// Swap the weapon in `slot`. The old weapon is stopped and reset before
    /// the new one is built against the current ammo inventory.
    pub fn equip_weapon(&mut self, slot: usize, config: Option<WeaponConfig>) -> Option<Weapon> {
        if let Some((weapon, mut env)) = self.weapon_env(slot) {
            weapon.force_stop(&mut env);
            weapon.reset(&mut env);
        }
        let old = self.equipment.take(slot);
        let name = config.as_ref().map(|c| c.name.clone());
        if let Some(config) = config {
            let weapon = Weapon::new(config, &self.ammo);
            self.equipment.place(slot, weapon);
        }
        if old.is_some() || name.is_some() {
            debug!("{}: slot {} now holds {:?}", self.name, slot, name);
            self.events.emit(ActorEvent::WeaponChanged {
                actor: self.id,
                slot,
                weapon: name,
            });
        }
        old
    }

    // ========================================================================
    // Conditions
    // ========================================================================

    /// Force Frozen and stop all movement. Ignored on a dead actor.
    pub fn freeze(&mut self) {
        let current = self.condition.current();
        if current == ConditionState::Dead {
            return;
        }
        if current != ConditionState::Frozen {
            self.condition_before_freeze = Some(current);
        }
        self.controller.gravity_active = false;
        self.controller.reset_forces();
        self.condition.change_state(ConditionState::Frozen);
    }

    /// Leave Frozen. No-op unless currently Frozen.
    pub fn unfreeze(&mut self) {
        if self.condition.current() != ConditionState::Frozen {
            return;
        }
        let restored = self
            .condition_before_freeze
            .take()
            .unwrap_or(ConditionState::Normal);
        self.controller.gravity_active = true;
        self.condition.change_state(restored);
    }

    /// Switch to `condition` for `duration` seconds, then revert. Calls made
    /// before the revert keep the originally remembered condition and replace
    /// the pending revert instead of adding another.
    pub fn change_condition_temporarily(
        &mut self,
        condition: ConditionState,
        duration: f32,
        reset_forces: bool,
        disable_gravity: bool,
    ) {
        let current = self.condition.current();
        if current == ConditionState::Dead {
            return;
        }
        if self.temporary_condition_origin.is_none() {
            self.temporary_condition_origin = Some(current);
        }
        if reset_forces {
            self.controller.reset_forces();
        }
        if disable_gravity {
            self.controller.gravity_active = false;
        }
        self.condition.change_state(condition);
        let due = self.now + duration;
        self.scheduler.schedule_exclusive(
            TimerSlot::ConditionRevert,
            due,
            ScheduledTask::RevertCondition {
                restore_gravity: disable_gravity,
            },
        );
    }

    fn revert_temporary_condition(&mut self, restore_gravity: bool) {
        let origin = self.temporary_condition_origin.take();
        if self.condition.current() == ConditionState::Dead {
            return;
        }
        if restore_gravity {
            self.controller.gravity_active = true;
        }
        self.condition
            .change_state(origin.unwrap_or(ConditionState::Normal));
    }

    pub(crate) fn clear_temporary_condition(&mut self) {
        self.temporary_condition_origin = None;
        self.condition_before_freeze = None;
    }

    pub fn temporary_condition_origin(&self) -> Option<ConditionState> {
        self.temporary_condition_origin
    }

    // ========================================================================
    // Scheduled work
    // ========================================================================

    /// Run every timer that is due at the current clock.
    pub(crate) fn run_due_tasks(&mut self) {
        for task in self.scheduler.poll(self.now) {
            self.run_task(task);
        }
    }

    fn run_task(&mut self, task: ScheduledTask) {
        match task {
            ScheduledTask::RevertCondition { restore_gravity } => {
                self.revert_temporary_condition(restore_gravity);
            }
            ScheduledTask::EndInvulnerability => self.end_invulnerability(),
            ScheduledTask::Destroy => self.finish_destruction(),
            ScheduledTask::DamageOverTime {
                request,
                remaining,
                interval,
            } => {
                if !self.is_alive() {
                    return;
                }
                self.damage(request.clone());
                self.schedule_damage_over_time(request, remaining - 1, interval);
            }
            ScheduledTask::EndSpeedModifier(source) => {
                self.speed_modifiers.remove(&source);
            }
        }
    }

    // ========================================================================
    // Orchestrator hand-offs
    // ========================================================================

    pub(crate) fn request_death_reset(&mut self) {
        self.pending.death_reset = true;
    }

    pub(crate) fn request_reinitialize(&mut self) {
        self.pending.reinitialize = true;
    }

    pub(crate) fn take_death_reset(&mut self) -> bool {
        std::mem::take(&mut self.pending.death_reset)
    }

    pub(crate) fn take_reinitialize(&mut self) -> bool {
        std::mem::take(&mut self.pending.reinitialize)
    }

    pub(crate) fn push_delegated(&mut self, damage: DelegatedDamage) {
        self.delegated.push(damage);
    }

    /// Damage this actor owes its master, for the world to route.
    pub fn drain_delegated(&mut self) -> Vec<DelegatedDamage> {
        std::mem::take(&mut self.delegated)
    }
}

impl std::fmt::Debug for ActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorState")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("now", &self.now)
            .field("condition", &self.condition.current())
            .field("movement", &self.movement.current())
            .field("health", &self.health.current())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
