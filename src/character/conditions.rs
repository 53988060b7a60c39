//! Condition and movement states
//!
//! Every actor carries exactly one of each at any instant.

use serde::{Deserialize, Serialize};

/// What the actor is allowed to be doing, broadly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConditionState {
    #[default]
    Normal,
    /// Something other than input drives the actor (knockback, scripted motion)
    ControlledMovement,
    Frozen,
    Paused,
    Dead,
    Stunned,
}

impl ConditionState {
    pub fn is_alive(self) -> bool {
        self != ConditionState::Dead
    }
}

/// How the actor is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementState {
    #[default]
    Idle,
    Walking,
    Running,
    Crouching,
    Dashing,
    Jumping,
    Falling,
    Pushing,
}

impl MovementState {
    /// States the walk module owns and may freely switch between.
    pub fn is_ground_locomotion(self) -> bool {
        matches!(self, MovementState::Idle | MovementState::Walking)
    }
}
