//! Kinematic controller
//!
//! Top-down body with a movement velocity set by abilities and a decaying
//! impulse for recoil and knockback. Collision resolution is not modelled;
//! the flag is kept for collaborators that do resolve collisions.

use bevy::prelude::*;

/// Fraction of an impulse that decays per second.
pub const IMPULSE_DAMPING: f32 = 8.0;

#[derive(Debug, Clone)]
pub struct Controller {
    pub position: Vec2,
    /// Velocity requested by movement abilities
    pub velocity: Vec2,
    /// External push (recoil, knockback), decays over time
    pub impulse: Vec2,
    /// Unit facing direction
    pub facing: Vec2,
    pub collisions_enabled: bool,
    /// When false the controller ignores velocity and impulses
    pub enabled: bool,
    pub gravity_active: bool,
    pub tint: Vec4,
    pub initial_tint: Vec4,
    pub initial_position: Vec2,
}

impl Controller {
    pub fn new(position: Vec2, facing: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            impulse: Vec2::ZERO,
            facing: facing.try_normalize().unwrap_or(Vec2::X),
            collisions_enabled: true,
            enabled: true,
            gravity_active: true,
            tint: Vec4::ONE,
            initial_tint: Vec4::ONE,
            initial_position: position,
        }
    }

    pub fn add_impulse(&mut self, impulse: Vec2) {
        self.impulse += impulse;
    }

    pub fn set_movement(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Zero velocity and any pending impulse.
    pub fn reset_forces(&mut self) {
        self.velocity = Vec2::ZERO;
        self.impulse = Vec2::ZERO;
    }

    pub fn set_facing(&mut self, direction: Vec2) {
        if let Some(facing) = direction.try_normalize() {
            self.facing = facing;
        }
    }

    pub fn update(&mut self, dt: f32) {
        if !self.enabled {
            self.impulse = Vec2::ZERO;
            return;
        }
        self.position += (self.velocity + self.impulse) * dt;
        self.impulse *= (1.0 - IMPULSE_DAMPING * dt).max(0.0);
        if self.impulse.length_squared() < 1e-6 {
            self.impulse = Vec2::ZERO;
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::X)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_controller_does_not_move() {
        let mut controller = Controller::default();
        controller.velocity = Vec2::new(1.0, 0.0);
        controller.enabled = false;
        controller.update(1.0);
        assert_eq!(controller.position, Vec2::ZERO);
    }

    #[test]
    fn test_impulse_decays() {
        let mut controller = Controller::default();
        controller.add_impulse(Vec2::new(4.0, 0.0));
        controller.update(0.0625);
        assert_eq!(controller.position, Vec2::new(0.25, 0.0));
        assert_eq!(controller.impulse, Vec2::new(2.0, 0.0));
    }
}
