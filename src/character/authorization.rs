//! Ability authorization
//!
//! Whether a module may act is derived fresh every time it is asked, from the
//! module's own flags and blocklists and the actor's live state:
//!
//! - the module must be permitted
//! - the movement state must not be in its blocked movement states
//! - the condition state must not be in its blocked condition states
//! - no equipped weapon may be in one of its blocked weapon states
//! - the actor must not be dead, whatever the blocklists say
//!
//! Empty blocklists place no restriction on that axis.

use smallvec::SmallVec;

use super::conditions::{ConditionState, MovementState};
use super::state::ActorState;
use crate::weapon::WeaponState;

/// Flags and blocklists every ability module carries.
#[derive(Debug, Clone)]
pub struct AbilityBase {
    /// Disabled modules are skipped by every pass
    pub enabled: bool,
    /// Set by the orchestrator once `initialize` has run
    pub initialized: bool,
    /// Gameplay permission (e.g. an ability not yet unlocked)
    pub permitted: bool,
    pub blocked_movement_states: SmallVec<[MovementState; 4]>,
    pub blocked_condition_states: SmallVec<[ConditionState; 4]>,
    pub blocked_weapon_states: SmallVec<[WeaponState; 4]>,
    /// Authorization seen at the last check, for edge detection
    pub(crate) was_authorized: bool,
}

impl Default for AbilityBase {
    fn default() -> Self {
        Self {
            enabled: true,
            initialized: false,
            permitted: true,
            blocked_movement_states: SmallVec::new(),
            blocked_condition_states: SmallVec::new(),
            blocked_weapon_states: SmallVec::new(),
            was_authorized: true,
        }
    }
}

impl AbilityBase {
    pub fn blocking_conditions(mut self, states: &[ConditionState]) -> Self {
        self.blocked_condition_states.extend_from_slice(states);
        self
    }

    pub fn blocking_movement(mut self, states: &[MovementState]) -> Self {
        self.blocked_movement_states.extend_from_slice(states);
        self
    }

    pub fn blocking_weapon_states(mut self, states: &[WeaponState]) -> Self {
        self.blocked_weapon_states.extend_from_slice(states);
        self
    }

    /// Enabled and initialized: the module takes part in ticks.
    pub fn is_runnable(&self) -> bool {
        self.enabled && self.initialized
    }
}

/// The authorization predicate. Never cached.
pub fn ability_authorized(base: &AbilityBase, state: &ActorState) -> bool {
    let condition = state.condition.current();
    if condition == ConditionState::Dead {
        return false;
    }
    base.permitted
        && !base.blocked_movement_states.contains(&state.movement.current())
        && !base.blocked_condition_states.contains(&condition)
        && (base.blocked_weapon_states.is_empty()
            || !state
                .equipment
                .weapon_states()
                .any(|s| base.blocked_weapon_states.contains(&s)))
}
