//! Weapon switching
//!
//! Cycles a list of owned weapon configurations through one handle-weapon
//! slot. Blocked while that slot's weapon is reloading by default.

use std::any::Any;

use bevy::prelude::*;

use super::{AbilityContext, AbilityKind, CharacterAbility};
use crate::character::authorization::{ability_authorized, AbilityBase};
use crate::character::state::ActorState;
use crate::input::ButtonState;
use crate::weapon::{WeaponConfig, WeaponState};

pub struct CharacterSwitchWeapon {
    base: AbilityBase,
    /// Slot whose weapon gets replaced
    pub target_slot: usize,
    weapons: Vec<WeaponConfig>,
    current: Option<usize>,
}

impl CharacterSwitchWeapon {
    pub fn new(target_slot: usize, weapons: Vec<WeaponConfig>) -> Self {
        Self {
            base: AbilityBase::default().blocking_weapon_states(&[
                WeaponState::ReloadStart,
                WeaponState::Reload,
                WeaponState::ReloadStop,
            ]),
            target_slot,
            weapons,
            current: None,
        }
    }

    pub fn with_base(mut self, base: AbilityBase) -> Self {
        self.base = base;
        self
    }

    pub fn current_weapon(&self) -> Option<&WeaponConfig> {
        self.current.and_then(|i| self.weapons.get(i))
    }

    /// Equip the next weapon in the list. Returns false when refused.
    pub fn switch_to_next(&mut self, state: &mut ActorState) -> bool {
        if self.weapons.is_empty() || !ability_authorized(&self.base, state) {
            return false;
        }
        let next = self.current.map_or(0, |i| (i + 1) % self.weapons.len());
        let config = self.weapons[next].clone();
        info!("{} switches to {}", state.name, config.name);
        state.equip_weapon(self.target_slot, Some(config));
        self.current = Some(next);
        true
    }
}

impl CharacterAbility for CharacterSwitchWeapon {
    fn kind(&self) -> AbilityKind {
        AbilityKind::SwitchWeapon
    }

    fn base(&self) -> &AbilityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AbilityBase {
        &mut self.base
    }

    fn initialize(&mut self, state: &mut ActorState) {
        let equipped = state.equipment.get(self.target_slot).map(|w| w.name().to_string());
        self.current = equipped.and_then(|name| self.weapons.iter().position(|w| w.name == name));
    }

    fn early_process(&mut self, ctx: &mut AbilityContext) {
        if ctx.input.switch_weapon == ButtonState::Down {
            self.switch_to_next(ctx.state);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
