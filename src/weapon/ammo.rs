//! Ammunition sources
//!
//! A weapon draws ammo from exactly one source:
//! - `Unlimited` for non-magazine weapons without a pool
//! - `Magazine` for a local counter owned by the weapon
//! - `Pool` for a counter in the owner's `AmmoInventory`, shared by every
//!   weapon that references the same id
//!
//! The local counter and the pool are never used together.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Name of an ammo pool in an actor's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmmoId(pub String);

impl From<&str> for AmmoId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A delegated ammo counter: a loaded magazine plus a reserve to reload from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoPool {
    pub loaded: u32,
    pub magazine_size: u32,
    pub reserve: u32,
}

impl AmmoPool {
    pub fn new(magazine_size: u32, reserve: u32) -> Self {
        Self {
            loaded: magazine_size,
            magazine_size,
            reserve,
        }
    }

    /// Ammo a shot may draw from. Magazine weapons only see the loaded rounds.
    pub fn available(&self, magazine_based: bool) -> u32 {
        if magazine_based {
            self.loaded
        } else {
            self.loaded + self.reserve
        }
    }

    /// Take `amount` rounds. Returns false (and takes nothing) if short.
    pub fn consume(&mut self, amount: u32, magazine_based: bool) -> bool {
        if self.available(magazine_based) < amount {
            return false;
        }
        let from_loaded = amount.min(self.loaded);
        self.loaded -= from_loaded;
        self.reserve -= amount - from_loaded;
        true
    }

    /// Move rounds from the reserve into the magazine. Returns rounds moved.
    pub fn fill_magazine(&mut self) -> u32 {
        let moved = self.magazine_size.saturating_sub(self.loaded).min(self.reserve);
        self.loaded += moved;
        self.reserve -= moved;
        moved
    }

    pub fn is_exhausted(&self) -> bool {
        self.reserve == 0
    }
}

/// All ammo pools an actor carries.
#[derive(Debug, Clone, Default)]
pub struct AmmoInventory {
    pools: HashMap<AmmoId, AmmoPool>,
}

impl AmmoInventory {
    pub fn insert(&mut self, id: AmmoId, pool: AmmoPool) {
        self.pools.insert(id, pool);
    }

    pub fn contains(&self, id: &AmmoId) -> bool {
        self.pools.contains_key(id)
    }

    pub fn get(&self, id: &AmmoId) -> Option<&AmmoPool> {
        self.pools.get(id)
    }

    pub fn get_mut(&mut self, id: &AmmoId) -> Option<&mut AmmoPool> {
        self.pools.get_mut(id)
    }

    /// Add rounds to a pool's reserve (pickups).
    pub fn add_reserve(&mut self, id: &AmmoId, amount: u32) -> bool {
        match self.pools.get_mut(id) {
            Some(pool) => {
                pool.reserve += amount;
                true
            }
            None => false,
        }
    }
}

/// Where a weapon instance takes its rounds from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmmoSource {
    Unlimited,
    Magazine { loaded: u32, size: u32 },
    Pool(AmmoId),
}

/// Read-only ammo snapshot for UI consumers, refreshed once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AmmoDisplay {
    pub current: u32,
    pub maximum: u32,
    /// Rounds left in the delegated pool's reserve, if any
    pub reserve: Option<u32>,
    pub magazine_based: bool,
    pub unlimited: bool,
    pub reloading: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magazine_consumption_never_touches_reserve() {
        let mut pool = AmmoPool::new(2, 10);
        assert!(pool.consume(2, true));
        assert!(!pool.consume(1, true), "Empty magazine must refuse");
        assert_eq!(pool.reserve, 10);
    }

    #[test]
    fn test_non_magazine_consumption_spills_into_reserve() {
        let mut pool = AmmoPool::new(2, 10);
        assert!(pool.consume(5, false));
        assert_eq!((pool.loaded, pool.reserve), (0, 7));
    }

    #[test]
    fn test_fill_magazine_is_limited_by_reserve() {
        let mut pool = AmmoPool { loaded: 1, magazine_size: 6, reserve: 3 };
        assert_eq!(pool.fill_magazine(), 3);
        assert_eq!((pool.loaded, pool.reserve), (4, 0));
        assert!(pool.is_exhausted());
    }
}
