//! Facing module
//!
//! Writes the facing direction during the Early pass so that every Process
//! pass in the same tick (aiming, recoil, shot direction) sees it.

use std::any::Any;

use bevy::prelude::*;

use super::{AbilityContext, AbilityKind, CharacterAbility};
use crate::animator::AnimatorParameters;
use crate::character::authorization::AbilityBase;
use crate::character::conditions::ConditionState;
use crate::character::state::ActorState;

pub struct CharacterOrientation {
    base: AbilityBase,
    /// Face the movement direction when no aim is given
    pub face_movement: bool,
}

impl CharacterOrientation {
    pub fn new() -> Self {
        Self {
            base: AbilityBase::default()
                .blocking_conditions(&[ConditionState::Frozen, ConditionState::Stunned]),
            face_movement: true,
        }
    }
}

impl Default for CharacterOrientation {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterAbility for CharacterOrientation {
    fn kind(&self) -> AbilityKind {
        AbilityKind::Orientation
    }

    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn early_process(&mut self, ctx: &mut AbilityContext) {
        let direction = match ctx.input.aim {
            Some(aim) => aim,
            None if self.face_movement => ctx.input.movement,
            None => Vec2::ZERO,
        };
        ctx.state.controller.set_facing(direction);
    }

    fn update_animator(&self, state: &ActorState, animator: &mut AnimatorParameters) {
        let facing = state.controller.facing;
        animator.set_float("Angle", facing.y.atan2(facing.x).to_degrees());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
