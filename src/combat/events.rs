//! Actor events
//!
//! Point events raised at state boundaries (weapon changed, hit, death,
//! revive, health changed, weapon used, reloaded). Each actor owns an
//! `EventBus`: observers are registered and removed explicitly, and every
//! event is also queued for the world to drain into Bevy's event system.

use bevy::prelude::*;

use crate::character::ActorId;

#[derive(Debug, Clone, PartialEq)]
pub enum ActorEvent {
    WeaponChanged {
        actor: ActorId,
        slot: usize,
        /// Name of the newly equipped weapon (None = unequipped)
        weapon: Option<String>,
    },
    Hit {
        actor: ActorId,
        instigator: Option<ActorId>,
        /// Damage after resistances
        amount: f32,
        source: Option<String>,
    },
    Death {
        actor: ActorId,
        instigator: Option<ActorId>,
    },
    Revive {
        actor: ActorId,
    },
    HealthChanged {
        actor: ActorId,
        current: f32,
        maximum: f32,
    },
    WeaponUsed {
        actor: ActorId,
        slot: usize,
        weapon: String,
        origin: Vec2,
        direction: Vec2,
    },
    Reloaded {
        actor: ActorId,
        weapon: String,
    },
}

impl ActorEvent {
    /// The actor that raised the event.
    pub fn actor(&self) -> ActorId {
        match self {
            ActorEvent::WeaponChanged { actor, .. }
            | ActorEvent::Hit { actor, .. }
            | ActorEvent::Death { actor, .. }
            | ActorEvent::Revive { actor }
            | ActorEvent::HealthChanged { actor, .. }
            | ActorEvent::WeaponUsed { actor, .. }
            | ActorEvent::Reloaded { actor, .. } => *actor,
        }
    }
}

/// Bevy-side wrapper so unrelated systems can read actor events.
#[derive(Event, Debug, Clone)]
pub struct ActorEventMessage(pub ActorEvent);

/// Handle returned by `EventBus::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&ActorEvent) + Send + Sync>;

/// Per-actor observer list plus an outbox.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<(ObserverId, Observer)>,
    next_id: u64,
    pending: Vec<ActorEvent>,
}

impl EventBus {
    pub fn subscribe(&mut self, observer: impl FnMut(&ActorEvent) + Send + Sync + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Notify observers now and queue the event for draining.
    pub fn emit(&mut self, event: ActorEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer(&event);
        }
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<ActorEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[ActorEvent] {
        &self.pending
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .field("pending", &self.pending)
            .finish()
    }
}
