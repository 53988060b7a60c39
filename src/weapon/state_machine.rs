//! Weapon states and the legal transition table
//!
//! Eleven states, Idle initial, no terminal state. Only the edges listed in
//! `WeaponState::can_transition` may be taken; Interrupt and ForceStop are the
//! only ways to leave the firing sequence early. Interrupted can be entered
//! from every state outside the reload sequence.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponState {
    #[default]
    Idle,
    Start,
    DelayBeforeUse,
    Use,
    DelayBetweenUses,
    Stop,
    ReloadNeeded,
    ReloadStart,
    Reload,
    ReloadStop,
    Interrupted,
}

impl WeaponState {
    pub const ALL: [WeaponState; 11] = [
        WeaponState::Idle,
        WeaponState::Start,
        WeaponState::DelayBeforeUse,
        WeaponState::Use,
        WeaponState::DelayBetweenUses,
        WeaponState::Stop,
        WeaponState::ReloadNeeded,
        WeaponState::ReloadStart,
        WeaponState::Reload,
        WeaponState::ReloadStop,
        WeaponState::Interrupted,
    ];

    /// Any of the Reload* states. None of them can be interrupted.
    pub fn is_reload(self) -> bool {
        matches!(
            self,
            WeaponState::ReloadNeeded
                | WeaponState::ReloadStart
                | WeaponState::Reload
                | WeaponState::ReloadStop
        )
    }

    /// States in which an attack is in flight.
    pub fn is_firing(self) -> bool {
        matches!(
            self,
            WeaponState::Start
                | WeaponState::DelayBeforeUse
                | WeaponState::Use
                | WeaponState::DelayBetweenUses
        )
    }

    /// Animator boolean mirroring this state.
    pub fn animator_parameter(self) -> &'static str {
        match self {
            WeaponState::Idle => "WeaponIdle",
            WeaponState::Start => "WeaponStart",
            WeaponState::DelayBeforeUse => "WeaponDelayBeforeUse",
            WeaponState::Use => "WeaponUse",
            WeaponState::DelayBetweenUses => "WeaponDelayBetweenUses",
            WeaponState::Stop => "WeaponStop",
            WeaponState::ReloadNeeded => "WeaponReloadNeeded",
            WeaponState::ReloadStart => "WeaponReloadStart",
            WeaponState::Reload => "WeaponReload",
            WeaponState::ReloadStop => "WeaponReloadStop",
            WeaponState::Interrupted => "WeaponInterrupted",
        }
    }

    /// The transition table.
    pub fn can_transition(from: WeaponState, to: WeaponState) -> bool {
        use WeaponState::*;
        match from {
            Idle => matches!(to, Start | ReloadStart | Interrupted),
            Start => matches!(
                to,
                DelayBeforeUse | Use | Stop | ReloadNeeded | ReloadStart | Interrupted
            ),
            DelayBeforeUse => matches!(to, Use | Stop | ReloadNeeded | ReloadStart | Interrupted),
            Use => matches!(to, DelayBetweenUses | Stop | ReloadStart | Interrupted),
            DelayBetweenUses => matches!(to, Use | Stop | ReloadNeeded | ReloadStart | Interrupted),
            Stop => matches!(to, Idle | ReloadStart | Interrupted),
            ReloadNeeded => matches!(to, Idle | ReloadStart),
            ReloadStart => to == Reload,
            Reload => to == ReloadStop,
            ReloadStop => to == Idle,
            Interrupted => matches!(to, Idle | ReloadStart),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_cannot_jump_to_use() {
        assert!(!WeaponState::can_transition(WeaponState::Idle, WeaponState::Use));
    }

    #[test]
    fn test_reload_sequence_is_fixed() {
        for to in WeaponState::ALL {
            let allowed = WeaponState::can_transition(WeaponState::Reload, to);
            assert_eq!(allowed, to == WeaponState::ReloadStop, "Reload -> {:?}", to);
        }
    }

    #[test]
    fn test_every_other_state_can_be_interrupted() {
        for from in WeaponState::ALL
            .into_iter()
            .filter(|s| !s.is_reload() && *s != WeaponState::Interrupted)
        {
            assert!(
                WeaponState::can_transition(from, WeaponState::Interrupted),
                "{:?} -> Interrupted",
                from
            );
        }
    }

    #[test]
    fn test_reload_states_cannot_be_interrupted() {
        for from in WeaponState::ALL.into_iter().filter(|s| s.is_reload()) {
            assert!(!WeaponState::can_transition(from, WeaponState::Interrupted));
        }
    }
}
