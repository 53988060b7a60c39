//! Movement speed modifiers
//!
//! Multipliers applied on top of a movement module's base speed. Each source
//! owns at most one entry; setting it again replaces the old value.

use smallvec::SmallVec;

use super::resistance::DamageTypeId;

/// Who applied a speed modifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModifierSource {
    /// A weapon in the given handle-weapon slot, while in use
    Weapon(usize),
    /// A typed damage effect
    Damage(DamageTypeId),
}

#[derive(Debug, Clone, Default)]
pub struct SpeedModifiers {
    entries: SmallVec<[(ModifierSource, f32); 4]>,
}

impl SpeedModifiers {
    pub fn set(&mut self, source: ModifierSource, multiplier: f32) {
        debug_assert!(multiplier >= 0.0, "speed multiplier must be non-negative");
        match self.entries.iter_mut().find(|(s, _)| *s == source) {
            Some(entry) => entry.1 = multiplier,
            None => self.entries.push((source, multiplier)),
        }
    }

    pub fn remove(&mut self, source: &ModifierSource) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(s, _)| s != source);
        self.entries.len() != before
    }

    pub fn get(&self, source: &ModifierSource) -> Option<f32> {
        self.entries
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, m)| *m)
    }

    /// Product of all active multipliers (1.0 when none).
    pub fn multiplier(&self) -> f32 {
        self.entries.iter().map(|(_, m)| *m).product()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
