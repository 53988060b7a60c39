//! Feedback sink
//!
//! Opaque "play this cue" calls raised at state-machine transition points.
//! The core never knows how (or whether) a cue is rendered.

use std::sync::{Arc, Mutex};

use crate::character::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackCue {
    /// A handle-weapon module accepted a start request
    AbilityStart,
    /// A handle-weapon module force-stopped its weapon on release
    AbilityStop,
    WeaponStart,
    WeaponUse,
    WeaponStop,
    ReloadNeeded,
    Reload,
    ReloadImpossible,
    Hit,
    Death,
    Revive,
}

pub trait FeedbackSink: Send + Sync {
    fn play(&mut self, actor: ActorId, cue: FeedbackCue);
}

/// Drops every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn play(&mut self, _actor: ActorId, _cue: FeedbackCue) {}
}

/// Records cues into a shared list. Clone it before handing it to an actor
/// to keep a handle for inspection.
#[derive(Debug, Default, Clone)]
pub struct FeedbackRecorder {
    cues: Arc<Mutex<Vec<(ActorId, FeedbackCue)>>>,
}

impl FeedbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<(ActorId, FeedbackCue)> {
        self.cues.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count(&self, cue: FeedbackCue) -> usize {
        self.cues
            .lock()
            .map(|c| c.iter().filter(|(_, played)| *played == cue).count())
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut cues) = self.cues.lock() {
            cues.clear();
        }
    }
}

impl FeedbackSink for FeedbackRecorder {
    fn play(&mut self, actor: ActorId, cue: FeedbackCue) {
        if let Ok(mut cues) = self.cues.lock() {
            cues.push((actor, cue));
        }
    }
}
