//! Integration tests for the health and damage pipeline
//!
//! These tests verify that:
//! - Gates, resistances and typed effects run in order
//! - Death, delayed destruction and revive move the lifecycle correctly
//! - Damage over time and invulnerability windows follow the actor clock
//! - Linked pools delegate to their master

use actionsim::character::conditions::ConditionState;
use actionsim::character::health::{DamageOutcome, HealthConfig};
use actionsim::character::modifiers::ModifierSource;
use actionsim::character::resistance::{
    DamageRequest, DamageResistance, DamageTypeId, ForcedCondition, KnockbackResponse,
    ResistanceMode, ResistanceTarget, TimedSpeedModifier, TypedDamage,
};
use actionsim::character::state::Lifecycle;
use actionsim::character::{Actor, ActorConfig, ActorId};
use actionsim::combat::events::ActorEvent;
use actionsim::world::ActorWorld;
use bevy::math::Vec2;

// =============================================================================
// Helpers
// =============================================================================

fn target(health: HealthConfig) -> Actor {
    let mut config = ActorConfig::named("Target", 1);
    config.health = health;
    Actor::with_defaults(ActorId(0), config)
}

fn resistance(target: ResistanceTarget, mode: ResistanceMode) -> DamageResistance {
    DamageResistance {
        label: "armor".to_string(),
        priority: 0,
        target,
        mode,
        clamp: None,
        prevents_condition_change: false,
        prevents_movement_modifier: false,
        knockback: KnockbackResponse::Unaffected,
        active: true,
    }
}

fn typed(name: &str, amount: f32) -> TypedDamage {
    TypedDamage {
        damage_type: DamageTypeId::from(name),
        amount,
        forced_condition: None,
        speed_modifier: None,
        knockback_override: None,
    }
}

fn idle(actor: &mut Actor, ticks: usize, dt: f32) {
    for _ in 0..ticks {
        actor.tick(dt, &Default::default());
    }
}

fn current(actor: &Actor) -> f32 {
    actor.state().health.current()
}

// =============================================================================
// Damage Pipeline
// =============================================================================

#[test]
fn test_resistances_shape_final_damage() {
    let mut config = ActorConfig::named("Knight", 1);
    config.resistances = vec![
        resistance(ResistanceTarget::BaseDamage, ResistanceMode::Multiplier(0.5)),
        resistance(
            ResistanceTarget::Typed(DamageTypeId::from("fire")),
            ResistanceMode::Flat(5.0),
        ),
    ];
    let mut actor = Actor::with_defaults(ActorId(0), config);

    let outcome = actor.damage(DamageRequest::new(20.0).with_typed(typed("fire", 10.0)));

    assert_eq!(outcome, DamageOutcome::Applied { amount: 15.0, killed: false });
    assert_eq!(current(&actor), 85.0);
    assert_eq!(actor.state().health.last_damage, 15.0);
}

#[test]
fn test_hit_event_carries_source_and_instigator() {
    let mut actor = target(HealthConfig::default());
    actor.damage(
        DamageRequest::new(12.0)
            .from_instigator(ActorId(4))
            .with_source("Rifle"),
    );

    let hit = actor.state().events.pending().iter().find_map(|e| match e {
        ActorEvent::Hit {
            instigator, source, ..
        } => Some((*instigator, source.clone())),
        _ => None,
    });
    assert_eq!(hit, Some((Some(ActorId(4)), Some("Rifle".to_string()))));
}

#[test]
fn test_immune_and_invulnerable_reject() {
    let mut immune = target(HealthConfig {
        immune_to_damage: true,
        ..Default::default()
    });
    assert_eq!(immune.damage(DamageRequest::new(10.0)), DamageOutcome::Rejected);

    let mut invulnerable = target(HealthConfig {
        invulnerable: true,
        ..Default::default()
    });
    assert_eq!(invulnerable.damage(DamageRequest::new(10.0)), DamageOutcome::Rejected);
    assert_eq!(current(&invulnerable), 100.0);
}

#[test]
fn test_invincibility_window_expires() {
    let mut actor = target(HealthConfig::default());
    actor.damage(DamageRequest::new(10.0).with_invincibility(0.5));
    assert!(actor.state().health.is_invulnerable());
    assert_eq!(actor.damage(DamageRequest::new(10.0)), DamageOutcome::Rejected);

    idle(&mut actor, 1, 0.25);
    assert!(actor.state().health.is_invulnerable());
    idle(&mut actor, 1, 0.25);
    assert!(!actor.state().health.is_invulnerable());

    actor.damage(DamageRequest::new(10.0));
    assert_eq!(current(&actor), 80.0);
}

#[test]
fn test_typed_damage_forces_condition_unless_resisted() {
    let mut shock = typed("shock", 1.0);
    shock.forced_condition = Some(ForcedCondition {
        condition: ConditionState::Stunned,
        duration: 1.0,
        reset_forces: true,
        disable_gravity: false,
    });

    let mut actor = target(HealthConfig::default());
    actor.damage(DamageRequest::new(0.0).with_typed(shock.clone()));
    assert_eq!(actor.state().condition.current(), ConditionState::Stunned);
    idle(&mut actor, 4, 0.25);
    assert_eq!(actor.state().condition.current(), ConditionState::Normal);

    let mut config = ActorConfig::named("Insulated", 1);
    let mut insulation = resistance(
        ResistanceTarget::Typed(DamageTypeId::from("shock")),
        ResistanceMode::Multiplier(1.0),
    );
    insulation.prevents_condition_change = true;
    config.resistances = vec![insulation];
    let mut insulated = Actor::with_defaults(ActorId(1), config);
    insulated.damage(DamageRequest::new(0.0).with_typed(shock));
    assert_eq!(insulated.state().condition.current(), ConditionState::Normal);
}

#[test]
fn test_typed_slow_expires() {
    let mut frost = typed("frost", 2.0);
    frost.speed_modifier = Some(TimedSpeedModifier {
        multiplier: 0.5,
        duration: 1.0,
    });
    let mut actor = target(HealthConfig::default());

    actor.damage(DamageRequest::new(0.0).with_typed(frost));
    let source = ModifierSource::Damage(DamageTypeId::from("frost"));
    assert_eq!(actor.state().speed_modifiers.get(&source), Some(0.5));
    assert_eq!(current(&actor), 98.0);

    idle(&mut actor, 4, 0.25);
    assert_eq!(actor.state().speed_modifiers.get(&source), None);
    assert_eq!(actor.state().speed_modifiers.multiplier(), 1.0);
}

#[test]
fn test_knockback_respects_immunity() {
    let mut actor = target(HealthConfig::default());
    actor.damage(DamageRequest::new(1.0).with_knockback(Vec2::new(2.0, 0.0), 5.0));
    assert_eq!(actor.state().controller.impulse, Vec2::new(5.0, 0.0));

    let mut anchored = target(HealthConfig {
        immune_to_knockback: true,
        ..Default::default()
    });
    anchored.damage(DamageRequest::new(1.0).with_knockback(Vec2::X, 5.0));
    assert_eq!(anchored.state().controller.impulse, Vec2::ZERO);
}

#[test]
fn test_unkillable_counter_never_dies() {
    let mut dummy = target(HealthConfig {
        initial_health: 0.0,
        maximum_health: 0.0,
        ..Default::default()
    });
    for _ in 0..3 {
        dummy.damage(DamageRequest::new(50.0));
    }
    assert_eq!(current(&dummy), -150.0);
    assert!(dummy.state().is_alive());
}

#[test]
fn test_damage_over_time_ticks_on_interval() {
    let mut actor = target(HealthConfig::default());
    actor
        .state_mut()
        .damage_over_time(DamageRequest::new(10.0), 3, 0.5);
    assert_eq!(current(&actor), 90.0);

    idle(&mut actor, 2, 0.25);
    assert_eq!(current(&actor), 80.0);
    idle(&mut actor, 2, 0.25);
    assert_eq!(current(&actor), 70.0);
    idle(&mut actor, 4, 0.25);
    assert_eq!(current(&actor), 70.0, "Three hits in total");
}

#[test]
fn test_interrupted_damage_over_time_stops() {
    let mut actor = target(HealthConfig::default());
    actor
        .state_mut()
        .damage_over_time(DamageRequest::new(10.0), 5, 0.5);
    idle(&mut actor, 2, 0.25);
    assert_eq!(current(&actor), 80.0);

    actor.state_mut().interrupt_damage_over_time();
    idle(&mut actor, 8, 0.25);
    assert_eq!(current(&actor), 80.0);
}

#[test]
fn test_reset_health_to_max_ignores_initial_health() {
    let mut actor = target(HealthConfig {
        initial_health: 40.0,
        maximum_health: 120.0,
        ..Default::default()
    });
    assert_eq!(current(&actor), 40.0);
    actor.state_mut().reset_health_to_max();
    assert_eq!(current(&actor), 120.0);
}

#[test]
fn test_heal_clamps_to_maximum() {
    let mut actor = target(HealthConfig::default());
    actor.damage(DamageRequest::new(30.0));
    actor.heal(50.0);
    assert_eq!(current(&actor), 100.0);
}

// =============================================================================
// Death & Revive
// =============================================================================

#[test]
fn test_lethal_damage_kills() {
    let mut actor = target(HealthConfig::default());
    let outcome = actor.damage(DamageRequest::new(150.0).from_instigator(ActorId(3)));

    assert_eq!(outcome, DamageOutcome::Applied { amount: 150.0, killed: true });
    assert_eq!(current(&actor), 0.0);
    assert_eq!(actor.state().condition.current(), ConditionState::Dead);
    assert_eq!(actor.state().lifecycle, Lifecycle::Disabled);
    assert!(!actor.state().controller.enabled);
    assert!(actor.state().events.pending().contains(&ActorEvent::Death {
        actor: ActorId(0),
        instigator: Some(ActorId(3)),
    }));
    assert_eq!(actor.damage(DamageRequest::new(5.0)), DamageOutcome::Rejected);
}

#[test]
fn test_delayed_destruction() {
    let mut actor = target(HealthConfig {
        destroy_on_death: true,
        delay_before_destruction: 1.0,
        ..Default::default()
    });
    actor.kill();
    assert_eq!(actor.state().lifecycle, Lifecycle::Active);

    idle(&mut actor, 3, 0.25);
    assert_eq!(actor.state().lifecycle, Lifecycle::Active);
    idle(&mut actor, 1, 0.25);
    assert_eq!(actor.state().lifecycle, Lifecycle::Destroyed);
    assert!(!actor.revive());
}

#[test]
fn test_revive_before_destruction_cancels_it() {
    let mut actor = target(HealthConfig {
        destroy_on_death: true,
        delay_before_destruction: 1.0,
        respawn_at_initial_location: true,
        ..Default::default()
    });
    actor.state_mut().controller.position = Vec2::new(5.0, 5.0);
    actor.kill();
    idle(&mut actor, 2, 0.25);

    assert!(actor.revive());
    idle(&mut actor, 4, 0.25);

    let state = actor.state();
    assert_eq!(state.lifecycle, Lifecycle::Active);
    assert_eq!(state.condition.current(), ConditionState::Normal);
    assert_eq!(state.health.current(), 100.0);
    assert_eq!(state.controller.position, Vec2::ZERO);
    assert!(state
        .events
        .pending()
        .contains(&ActorEvent::Revive { actor: ActorId(0) }));
}

// =============================================================================
// Master Delegation
// =============================================================================

#[test]
fn test_child_hits_drain_master_even_when_invulnerable() {
    let mut world = ActorWorld::new();
    let master = world.spawn_default(ActorConfig::named("Boss", 1));
    let shield = world.spawn_default(ActorConfig::named("Shield", 1));
    assert!(world.link_health(shield, master));
    if let Some(boss) = world.actor_mut(master) {
        boss.state_mut().set_invulnerable(true);
    }

    world.damage(shield, DamageRequest::new(60.0));
    assert_eq!(world.health_of(master), Some((40.0, 100.0)));
    assert_eq!(world.health_of(shield), Some((40.0, 100.0)));

    world.damage(shield, DamageRequest::new(60.0));
    assert!(!world.actor(master).is_some_and(|a| a.state().is_alive()));
    assert_eq!(
        world.damage(shield, DamageRequest::new(1.0)),
        DamageOutcome::Rejected,
        "A dead master takes no more hits"
    );
}
