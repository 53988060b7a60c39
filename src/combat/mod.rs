//! Bevy integration
//!
//! `ActionCorePlugin` drives an `ActorWorld` from Bevy's clock:
//! - Decide: input providers fill `PendingInputs`
//! - Simulate: every actor ticks once with its pending input
//! - Resolve: game rules react to what the step raised (hit resolution)
//! - Report: actor events are published as `ActorEventMessage` and recorded
//!   in the `CombatLog`

use std::collections::HashMap;

use bevy::prelude::*;

pub mod events;
pub mod log;

use crate::character::ActorId;
use crate::input::InputState;
use crate::world::ActorWorld;
use events::{ActorEvent, ActorEventMessage};
use log::{CombatLog, CombatLogEventType};

/// Frame phases, run in this order every Update.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionPhase {
    /// Decision layer writes this frame's inputs
    Decide,
    Simulate,
    /// Rules reacting to events still pending in the world
    Resolve,
    Report,
}

/// Inputs for the next simulation step, consumed by it.
#[derive(Resource, Default, Debug)]
pub struct PendingInputs(pub HashMap<ActorId, InputState>);

pub struct ActionCorePlugin;

impl Plugin for ActionCorePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ActorEventMessage>()
            .init_resource::<ActorWorld>()
            .init_resource::<PendingInputs>()
            .init_resource::<CombatLog>()
            .init_resource::<SimulationSpeed>()
            .configure_sets(
                Update,
                (
                    ActionPhase::Decide,
                    ActionPhase::Simulate,
                    ActionPhase::Resolve,
                    ActionPhase::Report,
                )
                    .chain(),
            )
            .add_systems(Update, tick_actor_world.in_set(ActionPhase::Simulate))
            .add_systems(
                Update,
                (publish_actor_events, record_combat_log)
                    .chain()
                    .in_set(ActionPhase::Report),
            );
    }
}

/// Controls the speed of the simulation
#[derive(Resource)]
pub struct SimulationSpeed {
    /// Speed multiplier (0.0 = paused, 0.5 = half speed, 1.0 = normal, 2.0 = double)
    pub multiplier: f32,
}

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

impl SimulationSpeed {
    pub fn pause(&mut self) {
        self.multiplier = 0.0;
    }

    pub fn normal_speed(&mut self) {
        self.multiplier = 1.0;
    }

    pub fn double_speed(&mut self) {
        self.multiplier = 2.0;
    }

    pub fn is_paused(&self) -> bool {
        self.multiplier == 0.0
    }
}

// ============================================================================
// Systems
// ============================================================================

pub fn tick_actor_world(
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    mut world: ResMut<ActorWorld>,
    mut inputs: ResMut<PendingInputs>,
    mut combat_log: ResMut<CombatLog>,
) {
    let dt = time.delta_secs() * speed.multiplier;
    if dt <= 0.0 {
        return;
    }
    world.tick(dt, &inputs.0);
    inputs.0.clear();
    combat_log.match_time += dt;
}

pub fn publish_actor_events(mut world: ResMut<ActorWorld>, mut writer: EventWriter<ActorEventMessage>) {
    for event in world.drain_events() {
        writer.send(ActorEventMessage(event));
    }
}

pub fn record_combat_log(
    mut reader: EventReader<ActorEventMessage>,
    world: Res<ActorWorld>,
    mut combat_log: ResMut<CombatLog>,
) {
    let name = |id: ActorId| {
        world
            .actor(id)
            .map_or_else(|| format!("Actor {}", id), |a| a.name().to_string())
    };

    for ActorEventMessage(event) in reader.read() {
        match event {
            ActorEvent::Hit {
                actor,
                instigator,
                amount,
                source,
            } => {
                let attacker = instigator.map_or_else(|| "Environment".to_string(), name);
                let target = name(*actor);
                let weapon = source.clone().unwrap_or_else(|| "Damage".to_string());
                let message = format!("{}'s {} hits {} for {:.0}", attacker, weapon, target, amount);
                combat_log.log_damage(attacker, target, weapon, *amount, false, message);
            }
            ActorEvent::Death { actor, instigator } => {
                let target = name(*actor);
                let killer = instigator.map(name);
                combat_log.mark_killing_blow(&target);
                let message = match &killer {
                    Some(killer) => format!("{} was killed by {}", target, killer),
                    None => format!("{} died", target),
                };
                combat_log.log_death(target, killer, message);
            }
            ActorEvent::Revive { actor } => {
                combat_log.log(CombatLogEventType::Revive, format!("{} revived", name(*actor)));
            }
            ActorEvent::WeaponUsed { actor, weapon, .. } => {
                let shooter = name(*actor);
                let message = format!("{} fires {}", shooter, weapon);
                combat_log.log_weapon_used(shooter, weapon.clone(), message);
            }
            ActorEvent::WeaponChanged { actor, weapon, .. } => {
                let message = match weapon {
                    Some(weapon) => format!("{} equips {}", name(*actor), weapon),
                    None => format!("{} unequips", name(*actor)),
                };
                combat_log.log(CombatLogEventType::WeaponChanged, message);
            }
            ActorEvent::Reloaded { actor, weapon } => {
                combat_log.log(
                    CombatLogEventType::Reload,
                    format!("{} reloads {}", name(*actor), weapon),
                );
            }
            ActorEvent::HealthChanged { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::ActorConfig;
    use std::time::Duration;

    #[test]
    fn test_paused_simulation_does_not_tick() {
        let mut app = App::new();
        app.init_resource::<Time>().add_plugins(ActionCorePlugin);
        app.world_mut()
            .resource_mut::<ActorWorld>()
            .spawn_default(ActorConfig::named("Idle", 0));
        app.world_mut().resource_mut::<SimulationSpeed>().pause();

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(250));
        app.update();

        assert!(app.world().resource::<SimulationSpeed>().is_paused());
        assert_eq!(app.world().resource::<ActorWorld>().elapsed(), 0.0);

        app.world_mut().resource_mut::<SimulationSpeed>().double_speed();
        app.update();
        assert_eq!(app.world().resource::<ActorWorld>().elapsed(), 0.5);
    }
}
