//! Health pool and the damage pipeline
//!
//! Damage runs in a fixed order:
//! 1. gate (invulnerable, immune, already dead)
//! 2. resistances turn the base amount and typed damages into one number
//! 3. subtract from this pool, or hand the amount to the master pool
//! 4. optional invulnerability window
//! 5. typed side effects (forced condition, slow) unless resisted
//! 6. knockback unless immune
//! 7. at zero or below: clamp and kill
//!
//! A pool with `maximum_health == 0` is an unkillable counter: it is never
//! clamped and never dies. A pool with a master never uses its own current
//! value; the world reads and writes through to the master.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::conditions::ConditionState;
use super::modifiers::ModifierSource;
use super::resistance::{DamageRequest, ResistanceProcessor};
use super::scheduler::{ScheduledTask, TimerSlot};
use super::state::{ActorState, Lifecycle};
use super::ActorId;
use crate::combat::events::ActorEvent;
use crate::feedback::FeedbackCue;

// ============================================================================
// Configuration & State
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub initial_health: f32,
    /// 0 makes the pool an unkillable counter
    pub maximum_health: f32,
    pub invulnerable: bool,
    pub immune_to_damage: bool,
    pub immune_to_knockback: bool,
    pub disable_collisions_on_death: bool,
    pub disable_controller_on_death: bool,
    /// Destroyed actors cannot be revived; otherwise they are only disabled
    pub destroy_on_death: bool,
    pub delay_before_destruction: f32,
    pub respawn_at_initial_location: bool,
    pub reset_tint_on_revive: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            initial_health: 100.0,
            maximum_health: 100.0,
            invulnerable: false,
            immune_to_damage: false,
            immune_to_knockback: false,
            disable_collisions_on_death: true,
            disable_controller_on_death: true,
            destroy_on_death: false,
            delay_before_destruction: 0.0,
            respawn_at_initial_location: false,
            reset_tint_on_revive: true,
        }
    }
}

impl HealthConfig {
    pub fn with_max(maximum_health: f32) -> Self {
        Self {
            initial_health: maximum_health,
            maximum_health,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Health {
    pub config: HealthConfig,
    current: f32,
    invulnerable: bool,
    pub last_damage: f32,
    pub last_damage_direction: Vec2,
    pub last_instigator: Option<ActorId>,
    master: Option<ActorId>,
    resistances: Option<ResistanceProcessor>,
}

impl Health {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            current: config.initial_health,
            invulnerable: config.invulnerable,
            config,
            last_damage: 0.0,
            last_damage_direction: Vec2::ZERO,
            last_instigator: None,
            master: None,
            resistances: None,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn maximum(&self) -> f32 {
        self.config.maximum_health
    }

    pub fn is_unkillable_counter(&self) -> bool {
        self.config.maximum_health == 0.0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable
    }

    pub fn master(&self) -> Option<ActorId> {
        self.master
    }

    pub(crate) fn set_master(&mut self, master: Option<ActorId>) {
        self.master = master;
    }

    pub fn resistances(&self) -> Option<&ResistanceProcessor> {
        self.resistances.as_ref()
    }

    pub fn resistances_mut(&mut self) -> Option<&mut ResistanceProcessor> {
        self.resistances.as_mut()
    }

    pub fn set_resistances(&mut self, processor: Option<ResistanceProcessor>) {
        self.resistances = processor;
    }

    /// True when a pool of its own is depleted. Pools with a master never are.
    pub fn is_depleted(&self) -> bool {
        self.master.is_none() && !self.is_unkillable_counter() && self.current <= 0.0
    }

    pub fn can_take_damage(&self) -> bool {
        !self.invulnerable && !self.config.immune_to_damage && !self.is_depleted()
    }

    fn final_amount(&self, request: &DamageRequest) -> f32 {
        match &self.resistances {
            Some(processor) => processor.process_damage(request.amount, &request.typed),
            None => request.raw_total().max(0.0),
        }
    }

    fn subtract(&mut self, amount: f32) {
        self.current -= amount;
        if !self.is_unkillable_counter() {
            self.current = self.current.max(0.0);
        }
    }
}

/// Result of one damage call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Gated out; nothing changed
    Rejected,
    Applied { amount: f32, killed: bool },
    /// The amount belongs to the master pool
    Delegated { master: ActorId, amount: f32 },
}

/// Damage waiting to be applied to a master pool by the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelegatedDamage {
    pub master: ActorId,
    pub amount: f32,
    pub instigator: Option<ActorId>,
}

// ============================================================================
// Pipeline
// ============================================================================

impl ActorState {
    pub fn damage(&mut self, request: DamageRequest) -> DamageOutcome {
        if !self.health.can_take_damage() {
            debug!("{}: damage rejected", self.name);
            return DamageOutcome::Rejected;
        }

        let amount = self.health.final_amount(&request);

        let outcome = match self.health.master() {
            Some(master) => {
                self.push_delegated(DelegatedDamage {
                    master,
                    amount,
                    instigator: request.instigator,
                });
                DamageOutcome::Delegated { master, amount }
            }
            None => {
                self.health.subtract(amount);
                DamageOutcome::Applied { amount, killed: false }
            }
        };

        self.health.last_damage = amount;
        self.health.last_damage_direction = request.direction;
        self.health.last_instigator = request.instigator;
        self.play(FeedbackCue::Hit);
        self.events.emit(ActorEvent::Hit {
            actor: self.id,
            instigator: request.instigator,
            amount,
            source: request.source.clone(),
        });
        if self.health.master().is_none() {
            self.emit_health_changed();
        }

        if request.invincibility_duration > 0.0 {
            self.health.invulnerable = true;
            let due = self.now() + request.invincibility_duration;
            self.scheduler
                .schedule_exclusive(TimerSlot::Invulnerability, due, ScheduledTask::EndInvulnerability);
        }

        self.apply_typed_effects(&request);
        self.apply_knockback(&request);

        if self.health.is_depleted() {
            self.kill();
            return DamageOutcome::Applied { amount, killed: true };
        }
        outcome
    }

    fn apply_typed_effects(&mut self, request: &DamageRequest) {
        for typed in &request.typed {
            let processor = self.health.resistances();
            let block_condition =
                processor.is_some_and(|p| p.prevents_condition_change(&typed.damage_type));
            let block_slow =
                processor.is_some_and(|p| p.prevents_movement_modifier(&typed.damage_type));

            if let Some(forced) = typed.forced_condition.as_ref().filter(|_| !block_condition) {
                self.change_condition_temporarily(
                    forced.condition,
                    forced.duration,
                    forced.reset_forces,
                    forced.disable_gravity,
                );
            }
            if let Some(slow) = typed.speed_modifier.as_ref().filter(|_| !block_slow) {
                let source = ModifierSource::Damage(typed.damage_type.clone());
                self.speed_modifiers.set(source.clone(), slow.multiplier);
                let due = self.now() + slow.duration;
                self.scheduler.schedule_exclusive(
                    TimerSlot::SpeedModifier(source.clone()),
                    due,
                    ScheduledTask::EndSpeedModifier(source),
                );
            }
        }
    }

    fn apply_knockback(&mut self, request: &DamageRequest) {
        if self.health.config.immune_to_knockback {
            return;
        }
        let force = request
            .typed
            .iter()
            .find_map(|t| t.knockback_override)
            .unwrap_or(request.knockback_force);
        let force = match self.health.resistances() {
            Some(processor) => processor.process_knockback(force, &request.typed),
            None => force,
        };
        if force > 0.0 {
            let direction = request.direction.normalize_or_zero();
            self.controller.add_impulse(direction * force);
        }
    }

    /// Master side of a delegated hit: no gates besides being alive.
    pub fn receive_delegated_damage(&mut self, amount: f32, instigator: Option<ActorId>) -> DamageOutcome {
        if self.health.is_depleted() {
            return DamageOutcome::Rejected;
        }
        self.health.subtract(amount);
        self.health.last_damage = amount;
        self.health.last_instigator = instigator;
        self.emit_health_changed();
        if self.health.is_depleted() {
            self.kill();
            return DamageOutcome::Applied { amount, killed: true };
        }
        DamageOutcome::Applied { amount, killed: false }
    }

    /// Apply `request` now, then every `interval` for `repeats - 1` more hits.
    /// Replaces any damage over time already running.
    pub fn damage_over_time(&mut self, request: DamageRequest, repeats: u32, interval: f32) {
        if repeats == 0 {
            return;
        }
        self.scheduler.cancel_slot(&TimerSlot::DamageOverTime);
        self.damage(request.clone());
        self.schedule_damage_over_time(request, repeats - 1, interval);
    }

    pub(crate) fn schedule_damage_over_time(&mut self, request: DamageRequest, remaining: u32, interval: f32) {
        if remaining == 0 || !self.condition.current().is_alive() {
            return;
        }
        let due = self.now() + interval;
        self.scheduler.schedule_exclusive(
            TimerSlot::DamageOverTime,
            due,
            ScheduledTask::DamageOverTime {
                request,
                remaining,
                interval,
            },
        );
    }

    pub fn interrupt_damage_over_time(&mut self) {
        self.scheduler.cancel_slot(&TimerSlot::DamageOverTime);
    }

    /// Restore health, clamped to the maximum. No-op on a dead actor.
    pub fn heal(&mut self, amount: f32) {
        if !self.condition.current().is_alive() || amount <= 0.0 {
            return;
        }
        let healed = self.health.current + amount;
        self.health.current = if self.health.is_unkillable_counter() {
            healed
        } else {
            healed.min(self.health.maximum())
        };
        self.emit_health_changed();
    }

    pub fn reset_health_to_max(&mut self) {
        self.health.current = self.health.maximum();
        self.emit_health_changed();
    }

    pub fn set_invulnerable(&mut self, invulnerable: bool) {
        self.health.invulnerable = invulnerable;
        if !invulnerable {
            self.scheduler.cancel_slot(&TimerSlot::Invulnerability);
        }
    }

    pub(crate) fn end_invulnerability(&mut self) {
        self.health.invulnerable = self.health.config.invulnerable;
    }

    /// Dead, optionally without collisions or controller, then destroyed or
    /// disabled (now or after the configured delay).
    pub fn kill(&mut self) {
        if !self.condition.current().is_alive() {
            return;
        }
        if !self.health.is_unkillable_counter() {
            self.health.current = 0.0;
        }
        self.condition.change_state(ConditionState::Dead);
        self.scheduler.cancel_slot(&TimerSlot::ConditionRevert);
        self.scheduler.cancel_slot(&TimerSlot::DamageOverTime);
        self.clear_temporary_condition();

        if self.health.config.disable_collisions_on_death {
            self.controller.collisions_enabled = false;
        }
        if self.health.config.disable_controller_on_death {
            self.controller.enabled = false;
        }
        self.controller.reset_forces();

        info!("{} died", self.name);
        self.play(FeedbackCue::Death);
        self.events.emit(ActorEvent::Death {
            actor: self.id,
            instigator: self.health.last_instigator,
        });
        self.request_death_reset();

        let delay = self.health.config.delay_before_destruction;
        if delay > 0.0 {
            let due = self.now() + delay;
            self.scheduler
                .schedule_exclusive(TimerSlot::Destruction, due, ScheduledTask::Destroy);
        } else {
            self.finish_destruction();
        }
    }

    pub(crate) fn finish_destruction(&mut self) {
        self.lifecycle = if self.health.config.destroy_on_death {
            Lifecycle::Destroyed
        } else {
            Lifecycle::Disabled
        };
    }

    /// Bring a dead (not destroyed) actor back. Returns false if it cannot be revived.
    pub fn revive(&mut self) -> bool {
        if self.lifecycle == Lifecycle::Destroyed {
            warn!("{} was destroyed and cannot be revived", self.name);
            return false;
        }
        self.scheduler.cancel_slot(&TimerSlot::Destruction);
        self.lifecycle = Lifecycle::Active;
        self.controller.collisions_enabled = true;
        self.controller.enabled = true;
        self.controller.gravity_active = true;
        self.condition.change_state(ConditionState::Normal);
        if self.health.config.reset_tint_on_revive {
            self.controller.tint = self.controller.initial_tint;
        }
        if self.health.config.respawn_at_initial_location {
            self.controller.position = self.controller.initial_position;
        }
        self.restore_health();
        self.play(FeedbackCue::Revive);
        self.events.emit(ActorEvent::Revive { actor: self.id });
        self.request_reinitialize();
        true
    }

    pub(crate) fn restore_health(&mut self) {
        self.health.current = self.health.config.initial_health;
        self.scheduler.cancel_slot(&TimerSlot::Invulnerability);
        self.health.invulnerable = self.health.config.invulnerable;
        self.emit_health_changed();
    }

    fn emit_health_changed(&mut self) {
        self.events.emit(ActorEvent::HealthChanged {
            actor: self.id,
            current: self.health.current,
            maximum: self.health.maximum(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unkillable_counter_goes_negative() {
        let mut health = Health::new(HealthConfig {
            initial_health: 5.0,
            maximum_health: 0.0,
            ..Default::default()
        });
        health.subtract(10.0);
        assert_eq!(health.current(), -5.0);
        assert!(!health.is_depleted());
        assert!(health.can_take_damage());
    }

    #[test]
    fn test_regular_pool_clamps_at_zero() {
        let mut health = Health::new(HealthConfig::with_max(10.0));
        health.subtract(25.0);
        assert_eq!(health.current(), 0.0);
        assert!(!health.can_take_damage());
    }
}
