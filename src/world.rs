//! The actor world
//!
//! Owns every actor, ticks them in spawn order and carries the little state
//! actors share: master health links. Actors never touch each other directly;
//! delegated damage queued by a linked child during its tick is routed to the
//! master once every actor has ticked.

use std::collections::{BTreeSet, HashMap};

use bevy::prelude::*;

use crate::animator::{AnimatorSink, NullAnimator};
use crate::character::health::DamageOutcome;
use crate::character::resistance::DamageRequest;
use crate::character::{Actor, ActorConfig, ActorId};
use crate::combat::events::ActorEvent;
use crate::feedback::{FeedbackSink, NullFeedback};
use crate::input::{InputProvider, InputState};

#[derive(Resource, Default, Debug)]
pub struct ActorWorld {
    actors: Vec<Actor>,
    elapsed: f32,
}

impl ActorWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds simulated so far.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    fn next_id(&self) -> ActorId {
        ActorId(self.actors.len() as u32)
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    pub fn spawn(
        &mut self,
        config: ActorConfig,
        feedback: Box<dyn FeedbackSink>,
        animator: Box<dyn AnimatorSink>,
    ) -> ActorId {
        self.spawn_with(|id| Actor::new(id, config, feedback, animator))
    }

    pub fn spawn_default(&mut self, config: ActorConfig) -> ActorId {
        self.spawn(config, Box::new(NullFeedback), Box::new(NullAnimator))
    }

    /// Build an actor for the next free id (add modules inside `build`).
    pub fn spawn_with(&mut self, build: impl FnOnce(ActorId) -> Actor) -> ActorId {
        let id = self.next_id();
        let actor = build(id);
        debug_assert_eq!(actor.id(), id, "actor built with a foreign id");
        info!("Spawned {} ({}) on team {}", actor.name(), id, actor.state().team);
        self.actors.push(actor);
        id
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.0 as usize)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.actors.iter_mut()
    }

    // ========================================================================
    // Ticking
    // ========================================================================

    /// Tick every actor with its entry in `inputs` (neutral input otherwise).
    pub fn tick(&mut self, dt: f32, inputs: &HashMap<ActorId, InputState>) {
        self.elapsed += dt;
        for actor in self.actors.iter_mut() {
            let input = inputs.get(&actor.id()).copied().unwrap_or_default();
            actor.tick(dt, &input);
        }
        self.route_delegated_damage();
    }

    /// Tick every actor with input pulled from `provider` at the new time.
    pub fn tick_with(&mut self, dt: f32, provider: &mut dyn InputProvider) {
        self.elapsed += dt;
        let now = self.elapsed;
        for actor in self.actors.iter_mut() {
            let input = provider.input_for(actor.id(), now);
            actor.tick(dt, &input);
        }
        self.route_delegated_damage();
    }

    fn route_delegated_damage(&mut self) {
        let pending: Vec<_> = self
            .actors
            .iter_mut()
            .flat_map(|actor| actor.state_mut().drain_delegated())
            .collect();
        for hit in pending {
            match self.actor_mut(hit.master) {
                Some(master) => {
                    master.receive_delegated_damage(hit.amount, hit.instigator);
                }
                None => warn!("Delegated damage for unknown master {}", hit.master),
            }
        }
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Damage `target` and settle any share owed to its master immediately.
    pub fn damage(&mut self, target: ActorId, request: DamageRequest) -> DamageOutcome {
        if let Some(master) = self.actor(target).and_then(|a| a.state().health.master()) {
            let master_alive = self.actor(master).is_some_and(|m| m.state().is_alive());
            if !master_alive {
                return DamageOutcome::Rejected;
            }
        }
        let Some(actor) = self.actor_mut(target) else {
            return DamageOutcome::Rejected;
        };
        let outcome = actor.damage(request);
        self.route_delegated_damage();
        outcome
    }

    /// Make `child`'s health read and write through `master`. Refuses self
    /// links and chains (a master may not itself have a master).
    pub fn link_health(&mut self, child: ActorId, master: ActorId) -> bool {
        if child == master {
            return false;
        }
        let master_is_linked = match self.actor(master) {
            Some(actor) => actor.state().health.master().is_some(),
            None => return false,
        };
        let child_is_master = self
            .actors
            .iter()
            .any(|a| a.state().health.master() == Some(child));
        if master_is_linked || child_is_master {
            return false;
        }
        match self.actor_mut(child) {
            Some(actor) => {
                actor.state_mut().health.set_master(Some(master));
                true
            }
            None => false,
        }
    }

    pub fn unlink_health(&mut self, child: ActorId) {
        if let Some(actor) = self.actor_mut(child) {
            actor.state_mut().health.set_master(None);
        }
    }

    /// Current and maximum health, read through the master link.
    pub fn health_of(&self, id: ActorId) -> Option<(f32, f32)> {
        let actor = self.actor(id)?;
        let owner = match actor.state().health.master() {
            Some(master) => self.actor(master)?,
            None => actor,
        };
        let health = &owner.state().health;
        Some((health.current(), health.maximum()))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Events raised by every actor since the last drain, in actor order.
    pub fn drain_events(&mut self) -> Vec<ActorEvent> {
        self.actors
            .iter_mut()
            .flat_map(|actor| actor.state_mut().events.drain())
            .collect()
    }

    /// Events raised since the last drain, without consuming them.
    pub fn pending_events(&self) -> impl Iterator<Item = &ActorEvent> {
        self.actors
            .iter()
            .flat_map(|actor| actor.state().events.pending().iter())
    }

    /// Teams with at least one living actor.
    pub fn living_teams(&self) -> BTreeSet<u8> {
        self.actors
            .iter()
            .filter(|a| a.state().is_alive())
            .map(|a| a.state().team)
            .collect()
    }

    /// Closest living actor on another team.
    pub fn nearest_enemy(&self, id: ActorId) -> Option<ActorId> {
        let me = self.actor(id)?.state();
        let origin = me.controller.position;
        self.actors
            .iter()
            .filter(|a| a.state().team != me.team && a.state().is_alive())
            .min_by(|a, b| {
                let da = a.state().controller.position.distance_squared(origin);
                let db = b.state().controller.position.distance_squared(origin);
                da.total_cmp(&db)
            })
            .map(Actor::id)
    }
}
