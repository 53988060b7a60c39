//! Walk module
//!
//! Turns the movement axis into controller velocity, scaled by the actor's
//! speed modifiers, and keeps the movement state in Idle or Walking.

use std::any::Any;

use bevy::prelude::*;

use super::{AbilityContext, AbilityKind, CharacterAbility};
use crate::animator::AnimatorParameters;
use crate::character::authorization::AbilityBase;
use crate::character::conditions::{ConditionState, MovementState};
use crate::character::state::ActorState;

/// Axis magnitude below which the actor counts as idle.
pub const IDLE_THRESHOLD: f32 = 0.05;

pub struct CharacterMovement {
    base: AbilityBase,
    pub walk_speed: f32,
    axis: Vec2,
}

impl CharacterMovement {
    pub fn new(walk_speed: f32) -> Self {
        Self {
            base: AbilityBase::default().blocking_conditions(&[
                ConditionState::Frozen,
                ConditionState::Stunned,
                ConditionState::Paused,
                ConditionState::ControlledMovement,
            ]),
            walk_speed,
            axis: Vec2::ZERO,
        }
    }

    pub fn with_base(mut self, base: AbilityBase) -> Self {
        self.base = base;
        self
    }

    fn stop(&mut self, state: &mut ActorState) {
        self.axis = Vec2::ZERO;
        state.controller.set_movement(Vec2::ZERO);
        if state.movement.current().is_ground_locomotion() {
            state.movement.change_state(MovementState::Idle);
        }
    }
}

impl CharacterAbility for CharacterMovement {
    fn kind(&self) -> AbilityKind {
        AbilityKind::Movement
    }

    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn early_process(&mut self, ctx: &mut AbilityContext) {
        self.axis = ctx.input.movement.clamp_length_max(1.0);
    }

    fn process(&mut self, ctx: &mut AbilityContext) {
        let speed = self.walk_speed * ctx.state.speed_modifiers.multiplier();
        ctx.state.controller.set_movement(self.axis * speed);

        if !ctx.state.movement.current().is_ground_locomotion() {
            return;
        }
        let next = if self.axis.length() > IDLE_THRESHOLD && speed > 0.0 {
            MovementState::Walking
        } else {
            MovementState::Idle
        };
        ctx.state.movement.change_state(next);
    }

    fn update_animator(&self, state: &ActorState, animator: &mut AnimatorParameters) {
        animator.set_bool("Idle", state.movement.is(MovementState::Idle));
        animator.set_bool("Walking", state.movement.is(MovementState::Walking));
        animator.set_float("Speed", state.controller.velocity.length());
    }

    fn on_authorization_lost(&mut self, state: &mut ActorState) {
        self.stop(state);
    }

    fn reset_ability(&mut self, state: &mut ActorState) {
        self.stop(state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
