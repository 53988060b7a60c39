//! Generic exclusive state holder
//!
//! Every actor carries several of these (condition, movement) and every
//! equipped weapon carries one. Exactly one state is current at any instant.
//!
//! - `change_state` to the current state is a no-op
//! - the previous state is kept for `restore_previous_state`
//! - a bounded history of entered states is kept for observation and tests

use std::collections::VecDeque;
use std::fmt::Debug;

/// Default number of entered states kept in the history ring.
pub const DEFAULT_HISTORY_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct StateMachine<T: Copy + Eq + Debug> {
    current: T,
    previous: T,
    history: VecDeque<T>,
    capacity: usize,
    /// Number of successful transitions since creation (never reset).
    transitions: u64,
}

impl<T: Copy + Eq + Debug> StateMachine<T> {
    pub fn new(initial: T) -> Self {
        Self::with_history(initial, DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a machine that remembers the last `capacity` entered states.
    pub fn with_history(initial: T, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut history = VecDeque::with_capacity(capacity);
        history.push_back(initial);
        Self {
            current: initial,
            previous: initial,
            history,
            capacity,
            transitions: 0,
        }
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn previous(&self) -> T {
        self.previous
    }

    pub fn is(&self, state: T) -> bool {
        self.current == state
    }

    /// Enter `new_state`. Returns false when already in that state.
    pub fn change_state(&mut self, new_state: T) -> bool {
        if new_state == self.current {
            return false;
        }
        self.previous = self.current;
        self.current = new_state;
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(new_state);
        self.transitions += 1;
        true
    }

    /// Go back to the state that was current before the last change.
    pub fn restore_previous_state(&mut self) -> bool {
        let previous = self.previous;
        self.change_state(previous)
    }

    /// Hard reset that bypasses the transition log (used by respawn and
    /// weapon resets, which are not transitions of the machine itself).
    pub fn reset(&mut self, state: T) {
        self.current = state;
        self.previous = state;
        self.history.clear();
        self.history.push_back(state);
    }

    /// Entered states, oldest first. The first entry is the initial (or last reset) state
    /// unless it has been pushed out of the ring.
    pub fn history(&self) -> impl Iterator<Item = T> + '_ {
        self.history.iter().copied()
    }

    pub fn transition_count(&self) -> u64 {
        self.transitions
    }
}

impl<T: Copy + Eq + Debug + Default> Default for StateMachine<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
        Amber,
    }

    #[test]
    fn test_change_to_same_state_is_noop() {
        let mut machine = StateMachine::new(Light::Red);
        assert!(!machine.change_state(Light::Red));
        assert_eq!(machine.transition_count(), 0);
        assert_eq!(machine.history().count(), 1);
    }

    #[test]
    fn test_restore_previous_state() {
        let mut machine = StateMachine::new(Light::Red);
        machine.change_state(Light::Green);
        machine.change_state(Light::Amber);
        assert_eq!(machine.previous(), Light::Green);
        assert!(machine.restore_previous_state());
        assert_eq!(machine.current(), Light::Green);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = StateMachine::with_history(Light::Red, 3);
        for _ in 0..5 {
            machine.change_state(Light::Green);
            machine.change_state(Light::Red);
        }
        let history: Vec<_> = machine.history().collect();
        assert_eq!(history.len(), 3);
        assert_eq!(history.last(), Some(&Light::Red));
        assert_eq!(machine.transition_count(), 10);
    }
}
