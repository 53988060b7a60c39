//! Input provider abstraction
//!
//! Humans and AI drive actors through the same `InputState`. A decision layer
//! only has to say which buttons are held this tick; `ButtonTracker` turns
//! that into edge states.

use bevy::prelude::*;

use crate::character::ActorId;

/// Edge-aware button state for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Off,
    /// Went down this tick
    Down,
    /// Held since an earlier tick
    Pressed,
    /// Released this tick
    Up,
}

impl ButtonState {
    pub fn from_held(was_held: bool, is_held: bool) -> Self {
        match (was_held, is_held) {
            (false, false) => ButtonState::Off,
            (false, true) => ButtonState::Down,
            (true, true) => ButtonState::Pressed,
            (true, false) => ButtonState::Up,
        }
    }

    pub fn is_held(self) -> bool {
        matches!(self, ButtonState::Down | ButtonState::Pressed)
    }
}

/// Command state for one actor for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    pub movement: Vec2,
    /// Aim direction set directly by a decision layer
    pub aim: Option<Vec2>,
    pub shoot: ButtonState,
    pub reload: ButtonState,
    pub switch_weapon: ButtonState,
}

/// Anything that can produce per-tick input for actors.
pub trait InputProvider {
    fn input_for(&mut self, actor: ActorId, now: f32) -> InputState;
}

/// Tracks held buttons across ticks and emits edge states.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonTracker {
    shoot: bool,
    reload: bool,
    switch_weapon: bool,
}

impl ButtonTracker {
    pub fn update(&mut self, shoot: bool, reload: bool, switch_weapon: bool) -> (ButtonState, ButtonState, ButtonState) {
        let states = (
            ButtonState::from_held(self.shoot, shoot),
            ButtonState::from_held(self.reload, reload),
            ButtonState::from_held(self.switch_weapon, switch_weapon),
        );
        self.shoot = shoot;
        self.reload = reload;
        self.switch_weapon = switch_weapon;
        states
    }
}

/// Timeline of inputs, replayed by actor clock. Each entry applies from its
/// start time until the next entry for the same actor.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    timeline: Vec<(ActorId, f32, InputState)>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, actor: ActorId, time: f32, input: InputState) -> Self {
        self.timeline.push((actor, time, input));
        self.timeline.sort_by(|a, b| a.1.total_cmp(&b.1));
        self
    }
}

impl InputProvider for ScriptedInput {
    fn input_for(&mut self, actor: ActorId, now: f32) -> InputState {
        self.timeline
            .iter()
            .filter(|(id, time, _)| *id == actor && *time <= now)
            .last()
            .map(|(_, _, input)| *input)
            .unwrap_or_default()
    }
}
