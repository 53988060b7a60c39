//! Damage vocabulary and the resistance processor
//!
//! A `DamageRequest` carries a base amount plus any number of typed damages.
//! Typed damages may force a temporary condition, slow the target, or override
//! knockback. The optional `ResistanceProcessor` transforms all of it before
//! the health pool sees a number.

use serde::{Deserialize, Serialize};

use super::conditions::ConditionState;
use crate::character::ActorId;
use bevy::prelude::Vec2;

// ============================================================================
// Damage Requests
// ============================================================================

/// Name of a damage type ("fire", "shock", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DamageTypeId(pub String);

impl From<&str> for DamageTypeId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A condition forced onto the target for a while.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedCondition {
    pub condition: ConditionState,
    pub duration: f32,
    #[serde(default)]
    pub reset_forces: bool,
    #[serde(default)]
    pub disable_gravity: bool,
}

/// A movement speed multiplier applied to the target for a while.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSpeedModifier {
    pub multiplier: f32,
    pub duration: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedDamage {
    pub damage_type: DamageTypeId,
    pub amount: f32,
    #[serde(default)]
    pub forced_condition: Option<ForcedCondition>,
    #[serde(default)]
    pub speed_modifier: Option<TimedSpeedModifier>,
    /// Replaces the request's knockback force when set
    #[serde(default)]
    pub knockback_override: Option<f32>,
}

/// One damage application.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageRequest {
    pub amount: f32,
    pub instigator: Option<ActorId>,
    /// Invulnerability granted to the target after this hit (0 = none)
    pub invincibility_duration: f32,
    /// Direction the damage travels in (used for knockback)
    pub direction: Vec2,
    pub knockback_force: f32,
    pub typed: Vec<TypedDamage>,
    /// What dealt the damage ("Rifle", "Poison"), for logs
    pub source: Option<String>,
}

impl DamageRequest {
    pub fn new(amount: f32) -> Self {
        Self {
            amount,
            instigator: None,
            invincibility_duration: 0.0,
            direction: Vec2::ZERO,
            knockback_force: 0.0,
            typed: Vec::new(),
            source: None,
        }
    }

    pub fn from_instigator(mut self, instigator: ActorId) -> Self {
        self.instigator = Some(instigator);
        self
    }

    pub fn with_invincibility(mut self, duration: f32) -> Self {
        self.invincibility_duration = duration;
        self
    }

    pub fn with_knockback(mut self, direction: Vec2, force: f32) -> Self {
        self.direction = direction;
        self.knockback_force = force;
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_typed(mut self, typed: TypedDamage) -> Self {
        self.typed.push(typed);
        self
    }

    /// Raw total with no resistances applied.
    pub fn raw_total(&self) -> f32 {
        self.amount + self.typed.iter().map(|t| t.amount).sum::<f32>()
    }
}

// ============================================================================
// Resistances
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResistanceTarget {
    /// The untyped base amount of a request
    BaseDamage,
    Typed(DamageTypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResistanceMode {
    /// Subtract a fixed amount
    Flat(f32),
    /// Scale by a factor (0.5 = half damage)
    Multiplier(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum KnockbackResponse {
    #[default]
    Unaffected,
    Multiplier(f32),
    Immune,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageResistance {
    pub label: String,
    /// Higher priorities are applied first
    #[serde(default)]
    pub priority: i32,
    pub target: ResistanceTarget,
    pub mode: ResistanceMode,
    /// Clamp the resulting amount into (min, max)
    #[serde(default)]
    pub clamp: Option<(f32, f32)>,
    #[serde(default)]
    pub prevents_condition_change: bool,
    #[serde(default)]
    pub prevents_movement_modifier: bool,
    #[serde(default)]
    pub knockback: KnockbackResponse,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl DamageResistance {
    fn applies_to(&self, target: &ResistanceTarget) -> bool {
        self.active && self.target == *target
    }

    fn apply(&self, amount: f32) -> f32 {
        let mut result = match self.mode {
            ResistanceMode::Flat(flat) => amount - flat,
            ResistanceMode::Multiplier(factor) => amount * factor,
        };
        if let Some((min, max)) = self.clamp {
            result = result.clamp(min, max);
        }
        result
    }
}

/// Ordered resistance list attached to a health pool.
#[derive(Debug, Clone, Default)]
pub struct ResistanceProcessor {
    resistances: Vec<DamageResistance>,
}

impl ResistanceProcessor {
    pub fn new(resistances: Vec<DamageResistance>) -> Self {
        let mut processor = Self::default();
        for resistance in resistances {
            processor.add(resistance);
        }
        processor
    }

    pub fn add(&mut self, resistance: DamageResistance) {
        self.resistances.push(resistance);
        // Stable sort keeps insertion order among equal priorities
        self.resistances.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn set_active(&mut self, label: &str, active: bool) {
        for resistance in self.resistances.iter_mut().filter(|r| r.label == label) {
            resistance.active = active;
        }
    }

    pub fn resistances(&self) -> &[DamageResistance] {
        &self.resistances
    }

    fn process_amount(&self, target: &ResistanceTarget, amount: f32) -> f32 {
        self.resistances
            .iter()
            .filter(|r| r.applies_to(target))
            .fold(amount, |acc, r| r.apply(acc))
            .max(0.0)
    }

    /// Final damage for a base amount plus typed damages.
    pub fn process_damage(&self, base: f32, typed: &[TypedDamage]) -> f32 {
        let base_total = self.process_amount(&ResistanceTarget::BaseDamage, base);
        let typed_total: f32 = typed
            .iter()
            .map(|t| self.process_amount(&ResistanceTarget::Typed(t.damage_type.clone()), t.amount))
            .sum();
        (base_total + typed_total).max(0.0)
    }

    pub fn prevents_condition_change(&self, damage_type: &DamageTypeId) -> bool {
        let target = ResistanceTarget::Typed(damage_type.clone());
        self.resistances
            .iter()
            .any(|r| r.applies_to(&target) && r.prevents_condition_change)
    }

    pub fn prevents_movement_modifier(&self, damage_type: &DamageTypeId) -> bool {
        let target = ResistanceTarget::Typed(damage_type.clone());
        self.resistances
            .iter()
            .any(|r| r.applies_to(&target) && r.prevents_movement_modifier)
    }

    /// Knockback after resistances. Base-damage resistances always apply;
    /// typed ones only when the request carries that type.
    pub fn process_knockback(&self, force: f32, typed: &[TypedDamage]) -> f32 {
        let mut result = force;
        for resistance in self.resistances.iter().filter(|r| r.active) {
            let relevant = match &resistance.target {
                ResistanceTarget::BaseDamage => true,
                ResistanceTarget::Typed(id) => typed.iter().any(|t| t.damage_type == *id),
            };
            if !relevant {
                continue;
            }
            match resistance.knockback {
                KnockbackResponse::Unaffected => {}
                KnockbackResponse::Multiplier(factor) => result *= factor,
                KnockbackResponse::Immune => return 0.0,
            }
        }
        result.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resistance(target: ResistanceTarget, mode: ResistanceMode, priority: i32) -> DamageResistance {
        DamageResistance {
            label: "test".to_string(),
            priority,
            target,
            mode,
            clamp: None,
            prevents_condition_change: false,
            prevents_movement_modifier: false,
            knockback: KnockbackResponse::Unaffected,
            active: true,
        }
    }

    fn fire(amount: f32) -> TypedDamage {
        TypedDamage {
            damage_type: DamageTypeId::from("fire"),
            amount,
            forced_condition: None,
            speed_modifier: None,
            knockback_override: None,
        }
    }

    #[test]
    fn test_priority_order_matters() {
        // Flat first (priority 10), then halve: (10 - 4) * 0.5 = 3
        let processor = ResistanceProcessor::new(vec![
            resistance(ResistanceTarget::BaseDamage, ResistanceMode::Multiplier(0.5), 1),
            resistance(ResistanceTarget::BaseDamage, ResistanceMode::Flat(4.0), 10),
        ]);
        assert_eq!(processor.process_damage(10.0, &[]), 3.0);
    }

    #[test]
    fn test_typed_resistance_only_hits_its_type() {
        let processor = ResistanceProcessor::new(vec![resistance(
            ResistanceTarget::Typed(DamageTypeId::from("fire")),
            ResistanceMode::Multiplier(0.0),
            0,
        )]);
        assert_eq!(processor.process_damage(5.0, &[fire(20.0)]), 5.0);
    }

    #[test]
    fn test_flat_resistance_never_heals() {
        let processor = ResistanceProcessor::new(vec![resistance(
            ResistanceTarget::BaseDamage,
            ResistanceMode::Flat(50.0),
            0,
        )]);
        assert_eq!(processor.process_damage(10.0, &[]), 0.0);
    }

    #[test]
    fn test_inactive_resistance_is_ignored() {
        let mut processor = ResistanceProcessor::new(vec![resistance(
            ResistanceTarget::BaseDamage,
            ResistanceMode::Multiplier(0.5),
            0,
        )]);
        processor.set_active("test", false);
        assert_eq!(processor.process_damage(10.0, &[]), 10.0);
    }

    #[test]
    fn test_knockback_immunity() {
        let mut immune = resistance(ResistanceTarget::BaseDamage, ResistanceMode::Flat(0.0), 0);
        immune.knockback = KnockbackResponse::Immune;
        let processor = ResistanceProcessor::new(vec![immune]);
        assert_eq!(processor.process_knockback(12.0, &[]), 0.0);
    }
}
