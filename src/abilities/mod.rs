//! Ability modules
//!
//! An ability module is one capability bound to an actor (movement, facing,
//! weapon handling, weapon switching). The actor drives every runnable module
//! through the same contract:
//!
//! 1. `pre_initialize` when the module is added (wires the owner id)
//! 2. `initialize` before the first tick, and again after a revive
//! 3. per tick, when authorized: `early_process`, `process`, `late_process`
//!    (each pass completes for all modules before the next begins)
//! 4. `update_animator` for every runnable module, authorized or not
//! 5. `reset_ability` on death and respawn, `teardown` when removed
//!
//! ## Lookup
//!
//! Modules are found through an `AbilityRegistry` keyed by `AbilityKind`,
//! built once when the actor initializes and rebuilt only on request.

pub mod handle_weapon;
pub mod movement;
pub mod orientation;
pub mod switch_weapon;

use std::any::Any;
use std::collections::HashMap;

use smallvec::SmallVec;

use crate::animator::AnimatorParameters;
use crate::character::authorization::AbilityBase;
use crate::character::state::ActorState;
use crate::character::ActorId;
use crate::input::InputState;

pub use handle_weapon::{HandleWeapon, HandleWeaponConfig};
pub use movement::CharacterMovement;
pub use orientation::CharacterOrientation;
pub use switch_weapon::CharacterSwitchWeapon;

/// Registry key for a module's capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbilityKind {
    Movement,
    Orientation,
    HandleWeapon,
    SwitchWeapon,
}

/// What a module sees during one pass.
pub struct AbilityContext<'a> {
    pub state: &'a mut ActorState,
    pub input: &'a InputState,
    pub delta: f32,
}

pub trait CharacterAbility: Send + Sync + 'static {
    fn kind(&self) -> AbilityKind;

    fn base(&self) -> &AbilityBase;

    fn base_mut(&mut self) -> &mut AbilityBase;

    /// Called once when the module is added to an actor.
    fn pre_initialize(&mut self, _owner: ActorId) {}

    fn initialize(&mut self, _state: &mut ActorState) {}

    /// Read input and update module-local fields.
    fn early_process(&mut self, _ctx: &mut AbilityContext) {}

    /// Core logic.
    fn process(&mut self, _ctx: &mut AbilityContext) {}

    /// Cleanup and finalization.
    fn late_process(&mut self, _ctx: &mut AbilityContext) {}

    /// Process pass while the module is not authorized. Commands stay gated,
    /// but work already under way may settle.
    fn blocked_process(&mut self, _ctx: &mut AbilityContext) {}

    /// Push read-only state to the animator.
    fn update_animator(&self, _state: &ActorState, _animator: &mut AnimatorParameters) {}

    /// The module was authorized at its last check and no longer is.
    fn on_authorization_lost(&mut self, _state: &mut ActorState) {}

    /// Restore transient defaults (death, respawn).
    fn reset_ability(&mut self, _state: &mut ActorState) {}

    fn teardown(&mut self, _state: &mut ActorState) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Kind-to-index lookup over an actor's module list.
#[derive(Debug, Clone, Default)]
pub struct AbilityRegistry {
    by_kind: HashMap<AbilityKind, SmallVec<[usize; 2]>>,
}

impl AbilityRegistry {
    pub fn build(abilities: &[Box<dyn CharacterAbility>]) -> Self {
        let mut by_kind: HashMap<AbilityKind, SmallVec<[usize; 2]>> = HashMap::new();
        for (index, ability) in abilities.iter().enumerate() {
            by_kind.entry(ability.kind()).or_default().push(index);
        }
        Self { by_kind }
    }

    pub fn first(&self, kind: AbilityKind) -> Option<usize> {
        self.by_kind.get(&kind).and_then(|indices| indices.first().copied())
    }

    pub fn all(&self, kind: AbilityKind) -> &[usize] {
        self.by_kind.get(&kind).map_or(&[], |indices| indices.as_slice())
    }

    pub fn contains(&self, kind: AbilityKind) -> bool {
        self.by_kind.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_keeps_every_module_of_a_kind() {
        let abilities: Vec<Box<dyn CharacterAbility>> = vec![
            Box::new(CharacterOrientation::new()),
            Box::new(HandleWeapon::new(HandleWeaponConfig::default())),
            Box::new(HandleWeapon::new(HandleWeaponConfig {
                slot: 1,
                ..Default::default()
            })),
        ];
        let registry = AbilityRegistry::build(&abilities);

        assert_eq!(registry.first(AbilityKind::HandleWeapon), Some(1));
        assert_eq!(registry.all(AbilityKind::HandleWeapon), &[1, 2]);
        assert!(registry.all(AbilityKind::Movement).is_empty());
        assert!(!registry.contains(AbilityKind::SwitchWeapon));
    }
}
