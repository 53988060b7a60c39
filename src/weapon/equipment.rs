//! Equipped weapons, one per handle-weapon slot
//!
//! Each slot changes hands atomically: the outgoing weapon is fully torn
//! down by the caller before the incoming one is stored. A per-slot
//! generation counter lets owners notice that the weapon was swapped.

use smallvec::SmallVec;

use super::{Weapon, WeaponState};

#[derive(Debug, Clone, Default)]
struct Slot {
    weapon: Option<Weapon>,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Equipment {
    slots: SmallVec<[Slot; 2]>,
}

impl Equipment {
    pub fn get(&self, slot: usize) -> Option<&Weapon> {
        self.slots.get(slot).and_then(|s| s.weapon.as_ref())
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Weapon> {
        self.slots.get_mut(slot).and_then(|s| s.weapon.as_mut())
    }

    /// Remove and return the weapon in `slot`.
    pub fn take(&mut self, slot: usize) -> Option<Weapon> {
        let entry = self.slots.get_mut(slot)?;
        let weapon = entry.weapon.take();
        if weapon.is_some() {
            entry.generation += 1;
        }
        weapon
    }

    /// Store `weapon` in an empty slot. The slot must have been emptied first.
    pub fn place(&mut self, slot: usize, weapon: Weapon) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, Slot::default);
        }
        let entry = &mut self.slots[slot];
        debug_assert!(entry.weapon.is_none(), "slot {} still holds a weapon", slot);
        entry.weapon = Some(weapon);
        entry.generation += 1;
    }

    /// Changes every time the slot's weapon is taken or placed.
    pub fn generation(&self, slot: usize) -> u32 {
        self.slots.get(slot).map_or(0, |s| s.generation)
    }

    /// States of every equipped weapon.
    pub fn weapon_states(&self) -> impl Iterator<Item = WeaponState> + '_ {
        self.slots
            .iter()
            .filter_map(|s| s.weapon.as_ref())
            .map(Weapon::state)
    }

    pub fn weapons(&self) -> impl Iterator<Item = &Weapon> {
        self.slots.iter().filter_map(|s| s.weapon.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.weapons().next().is_none()
    }
}
