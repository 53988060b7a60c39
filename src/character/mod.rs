//! Actors and their orchestrator
//!
//! An `Actor` owns one `ActorState` and an ordered list of ability modules.
//! Each tick it:
//!
//! 1. advances the actor clock and runs due timers
//! 2. runs the Early pass for every runnable module, then Process, then Late
//!    (each pass is a barrier: it finishes for all modules before the next)
//! 3. integrates the controller
//! 4. lets every runnable module write to the animator
//!
//! Authorization is re-derived for each module at each pass. A module that was
//! authorized at its last check and no longer is gets `on_authorization_lost`.

pub mod authorization;
pub mod conditions;
pub mod controller;
pub mod health;
pub mod modifiers;
pub mod resistance;
pub mod scheduler;
pub mod state;

use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityContext, AbilityKind, AbilityRegistry, CharacterAbility};
use crate::animator::{AnimatorParameters, AnimatorSink, NullAnimator};
use crate::feedback::{FeedbackSink, NullFeedback};
use crate::input::InputState;
use crate::weapon::{AmmoId, AmmoPool};
use authorization::ability_authorized;
use conditions::{ConditionState, MovementState};
use controller::Controller;
use health::{DamageOutcome, Health, HealthConfig};
use resistance::{DamageRequest, DamageResistance, ResistanceProcessor};
use scheduler::TimerSlot;
use state::{ActorState, Lifecycle};

/// Stable handle for an actor inside an `ActorWorld`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything needed to build an actor's state (modules are added separately).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    pub name: String,
    pub team: u8,
    pub position: Vec2,
    pub facing: Vec2,
    pub health: HealthConfig,
    pub resistances: Vec<DamageResistance>,
    pub ammo_pools: Vec<(AmmoId, AmmoPool)>,
    /// Warn about and skip animator parameters the sink does not declare
    pub animator_sanity_checks: bool,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            name: "Actor".to_string(),
            team: 0,
            position: Vec2::ZERO,
            facing: Vec2::X,
            health: HealthConfig::default(),
            resistances: Vec::new(),
            ammo_pools: Vec::new(),
            animator_sanity_checks: false,
        }
    }
}

impl ActorConfig {
    pub fn named(name: &str, team: u8) -> Self {
        Self {
            name: name.to_string(),
            team,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    Early,
    Process,
    Late,
}

pub struct Actor {
    state: ActorState,
    abilities: Vec<Box<dyn CharacterAbility>>,
    registry: AbilityRegistry,
    animator: AnimatorParameters,
    initialized: bool,
}

impl Actor {
    pub fn new(
        id: ActorId,
        config: ActorConfig,
        feedback: Box<dyn FeedbackSink>,
        animator: Box<dyn AnimatorSink>,
    ) -> Self {
        let mut health = Health::new(config.health);
        if !config.resistances.is_empty() {
            health.set_resistances(Some(ResistanceProcessor::new(config.resistances)));
        }
        let controller = Controller::new(config.position, config.facing);
        let mut state = ActorState::new(id, config.name, config.team, controller, health, feedback);
        for (ammo_id, pool) in config.ammo_pools {
            state.ammo.insert(ammo_id, pool);
        }
        Self {
            state,
            abilities: Vec::new(),
            registry: AbilityRegistry::default(),
            animator: AnimatorParameters::new(animator, config.animator_sanity_checks),
            initialized: false,
        }
    }

    /// An actor with no feedback or animator attached.
    pub fn with_defaults(id: ActorId, config: ActorConfig) -> Self {
        Self::new(id, config, Box::new(NullFeedback), Box::new(NullAnimator))
    }

    pub fn id(&self) -> ActorId {
        self.state.id
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn state(&self) -> &ActorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ActorState {
        &mut self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn abilities(&self) -> impl Iterator<Item = &dyn CharacterAbility> {
        self.abilities.iter().map(|a| a.as_ref())
    }

    // ========================================================================
    // Module lifecycle
    // ========================================================================

    /// Add a module. Its owner is wired immediately; it joins ticks once
    /// initialized (at the first tick, or via `recache_abilities`).
    pub fn add_ability(&mut self, mut ability: Box<dyn CharacterAbility>) {
        ability.pre_initialize(self.state.id);
        self.abilities.push(ability);
    }

    pub fn with_ability(mut self, ability: impl CharacterAbility) -> Self {
        self.add_ability(Box::new(ability));
        self
    }

    /// Initialize every module in order and build the registry.
    pub fn initialize(&mut self) {
        for ability in self.abilities.iter_mut() {
            ability.initialize(&mut self.state);
            let base = ability.base_mut();
            base.initialized = true;
            base.was_authorized = true;
        }
        self.registry = AbilityRegistry::build(&self.abilities);
        self.initialized = true;
        debug!(
            "{}: initialized {} ability modules",
            self.state.name,
            self.abilities.len()
        );
    }

    /// Re-run initialization on every module, even already initialized ones.
    pub fn force_abilities_initialization(&mut self) {
        self.initialize();
    }

    /// Initialize modules added since the last initialization and rebuild the
    /// registry. The registry is never rebuilt implicitly.
    pub fn recache_abilities(&mut self) {
        for ability in self.abilities.iter_mut() {
            if !ability.base().initialized {
                ability.initialize(&mut self.state);
                let base = ability.base_mut();
                base.initialized = true;
                base.was_authorized = true;
            }
        }
        self.registry = AbilityRegistry::build(&self.abilities);
    }

    /// Tear down every module in reverse order and drop them.
    pub fn teardown(&mut self) {
        for ability in self.abilities.iter_mut().rev() {
            ability.teardown(&mut self.state);
        }
        self.abilities.clear();
        self.registry = AbilityRegistry::default();
    }

    pub fn registry(&self) -> &AbilityRegistry {
        &self.registry
    }

    /// First module of `kind`, downcast to `T`.
    pub fn ability<T: CharacterAbility>(&self, kind: AbilityKind) -> Option<&T> {
        let index = self.registry.first(kind)?;
        self.abilities.get(index)?.as_any().downcast_ref::<T>()
    }

    pub fn ability_mut<T: CharacterAbility>(&mut self, kind: AbilityKind) -> Option<&mut T> {
        let index = self.registry.first(kind)?;
        self.abilities.get_mut(index)?.as_any_mut().downcast_mut::<T>()
    }

    /// Run `f` with the first module of `kind` and the actor state, for module
    /// commands that need both (e.g. `HandleWeapon::shoot_start`).
    pub fn with_ability_state<T: CharacterAbility, R>(
        &mut self,
        kind: AbilityKind,
        f: impl FnOnce(&mut T, &mut ActorState) -> R,
    ) -> Option<R> {
        let index = self.registry.first(kind)?;
        let ability = self.abilities.get_mut(index)?.as_any_mut().downcast_mut::<T>()?;
        Some(f(ability, &mut self.state))
    }

    // ========================================================================
    // Tick
    // ========================================================================

    pub fn tick(&mut self, dt: f32, input: &InputState) {
        if !self.initialized {
            self.initialize();
        }
        self.state.advance_clock(dt);
        self.state.run_due_tasks();
        self.apply_pending_module_work();
        if self.state.lifecycle != Lifecycle::Active {
            return;
        }

        self.run_pass(Pass::Early, input, dt);
        self.run_pass(Pass::Process, input, dt);
        self.run_pass(Pass::Late, input, dt);

        self.state.controller.update(dt);

        for ability in self.abilities.iter() {
            if ability.base().is_runnable() {
                ability.update_animator(&self.state, &mut self.animator);
            }
        }
        self.apply_pending_module_work();
    }

    fn run_pass(&mut self, pass: Pass, input: &InputState, dt: f32) {
        for ability in self.abilities.iter_mut() {
            if !ability.base().is_runnable() {
                continue;
            }
            let authorized = ability_authorized(ability.base(), &self.state);
            let was_authorized = std::mem::replace(&mut ability.base_mut().was_authorized, authorized);
            let mut ctx = AbilityContext {
                state: &mut self.state,
                input,
                delta: dt,
            };
            if !authorized {
                if was_authorized {
                    ability.on_authorization_lost(ctx.state);
                }
                if matches!(pass, Pass::Process) {
                    ability.blocked_process(&mut ctx);
                }
                continue;
            }
            match pass {
                Pass::Early => ability.early_process(&mut ctx),
                Pass::Process => ability.process(&mut ctx),
                Pass::Late => ability.late_process(&mut ctx),
            }
        }
    }

    /// Module work requested by health transitions (death resets, revive
    /// reinitialization).
    fn apply_pending_module_work(&mut self) {
        if self.state.take_death_reset() {
            for ability in self.abilities.iter_mut() {
                ability.reset_ability(&mut self.state);
            }
        }
        if self.state.take_reinitialize() {
            for ability in self.abilities.iter_mut() {
                ability.initialize(&mut self.state);
                ability.base_mut().was_authorized = true;
            }
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn damage(&mut self, request: DamageRequest) -> DamageOutcome {
        let outcome = self.state.damage(request);
        self.apply_pending_module_work();
        outcome
    }

    /// Master side of a hit taken by a linked child.
    pub fn receive_delegated_damage(
        &mut self,
        amount: f32,
        instigator: Option<ActorId>,
    ) -> DamageOutcome {
        let outcome = self.state.receive_delegated_damage(amount, instigator);
        self.apply_pending_module_work();
        outcome
    }

    pub fn kill(&mut self) {
        self.state.kill();
        self.apply_pending_module_work();
    }

    pub fn revive(&mut self) -> bool {
        let revived = self.state.revive();
        self.apply_pending_module_work();
        revived
    }

    pub fn heal(&mut self, amount: f32) {
        self.state.heal(amount);
    }

    pub fn freeze(&mut self) {
        self.state.freeze();
    }

    pub fn unfreeze(&mut self) {
        self.state.unfreeze();
    }

    pub fn change_condition_temporarily(
        &mut self,
        condition: ConditionState,
        duration: f32,
        reset_forces: bool,
        disable_gravity: bool,
    ) {
        self.state
            .change_condition_temporarily(condition, duration, reset_forces, disable_gravity);
    }

    /// Put the actor back in play at `position`, facing `facing`. Works on
    /// disabled and destroyed actors alike.
    pub fn respawn(&mut self, position: Vec2, facing: Vec2) {
        let state = &mut self.state;
        state.scheduler.cancel_slot(&TimerSlot::Destruction);
        state.scheduler.cancel_slot(&TimerSlot::ConditionRevert);
        state.scheduler.cancel_slot(&TimerSlot::DamageOverTime);
        state.clear_temporary_condition();
        state.speed_modifiers.clear();

        state.lifecycle = Lifecycle::Active;
        state.condition.change_state(ConditionState::Normal);
        state.movement.change_state(MovementState::Idle);
        state.controller.collisions_enabled = true;
        state.controller.enabled = true;
        state.controller.gravity_active = true;
        state.controller.reset_forces();
        state.controller.position = position;
        state.controller.set_facing(facing);
        state.restore_health();

        // The reset below covers any pending death reset
        state.take_death_reset();
        for ability in self.abilities.iter_mut() {
            ability.reset_ability(&mut self.state);
            ability.base_mut().was_authorized = true;
        }
        info!("{} respawned at ({:.1}, {:.1})", self.state.name, position.x, position.y);
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("state", &self.state)
            .field("abilities", &self.abilities.len())
            .field("initialized", &self.initialized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::CharacterMovement;

    #[test]
    fn test_actor_id_display() {
        assert_eq!(ActorId(7).to_string(), "#7");
    }

    #[test]
    fn test_first_tick_initializes_modules() {
        let mut actor = Actor::with_defaults(ActorId(1), ActorConfig::named("Walker", 0))
            .with_ability(CharacterMovement::new(4.0));
        assert!(!actor.is_initialized());
        assert!(actor.ability::<CharacterMovement>(AbilityKind::Movement).is_none());

        actor.tick(0.25, &InputState::default());

        assert!(actor.is_initialized());
        assert!(actor.registry().contains(AbilityKind::Movement));
        assert!(actor.ability::<CharacterMovement>(AbilityKind::Movement).is_some());
    }

    #[test]
    fn test_ammo_pools_from_config() {
        let mut config = ActorConfig::named("Gunner", 1);
        config.ammo_pools.push((AmmoId::from("rifle"), AmmoPool::new(10, 20)));
        let actor = Actor::with_defaults(ActorId(2), config);
        assert_eq!(
            actor.state().ammo.get(&AmmoId::from("rifle")).map(|p| p.reserve),
            Some(20)
        );
    }
}
