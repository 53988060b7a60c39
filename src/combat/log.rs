//! Combat logging
//!
//! Records actor events for display and post-match analysis. Entries carry a
//! human-readable message and, for the events that matter to aggregation,
//! structured data (who hit whom, with what, for how much).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::Serialize;

use crate::error::{ConfigError, Result};

/// Directory logs go to when no output path is given.
pub const DEFAULT_LOG_DIR: &str = "match_logs";

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize)]
pub struct CombatLogEntry {
    /// Timestamp in match time (seconds since match start)
    pub timestamp: f32,
    pub event_type: CombatLogEventType,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CombatLogEventType {
    Damage,
    Death,
    Revive,
    WeaponUsed,
    WeaponChanged,
    Reload,
    /// Match event (start, end, etc.)
    MatchEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum StructuredEventData {
    Damage {
        source: String,
        target: String,
        weapon: String,
        amount: f32,
        is_killing_blow: bool,
    },
    Death {
        target: String,
        killer: Option<String>,
    },
    WeaponUsed {
        actor: String,
        weapon: String,
    },
}

/// Per-actor summary written alongside the entries.
#[derive(Debug, Clone, Serialize)]
pub struct ActorMetadata {
    pub name: String,
    pub team: u8,
    pub max_health: f32,
    pub final_health: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub shots_fired: usize,
    pub final_position: (f32, f32),
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchMetadata {
    pub winner: Option<u8>,
    pub duration_secs: f32,
    pub random_seed: Option<u64>,
    pub actors: Vec<ActorMetadata>,
}

#[derive(Serialize)]
struct SavedLog<'a> {
    metadata: &'a MatchMetadata,
    entries: &'a [CombatLogEntry],
}

/// The combat log resource storing all events
#[derive(Resource, Default, Debug)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current match time
    pub match_time: f32,
}

impl CombatLog {
    /// Clear the log for a new match
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
    }

    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.push(event_type, message, None);
    }

    fn push(&mut self, event_type: CombatLogEventType, message: String, data: Option<StructuredEventData>) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
            data,
        });
    }

    pub fn log_damage(
        &mut self,
        source: String,
        target: String,
        weapon: String,
        amount: f32,
        is_killing_blow: bool,
        message: String,
    ) {
        let data = StructuredEventData::Damage {
            source,
            target,
            weapon,
            amount,
            is_killing_blow,
        };
        self.push(CombatLogEventType::Damage, message, Some(data));
    }

    pub fn log_death(&mut self, target: String, killer: Option<String>, message: String) {
        let data = StructuredEventData::Death { target, killer };
        self.push(CombatLogEventType::Death, message, Some(data));
    }

    pub fn log_weapon_used(&mut self, actor: String, weapon: String, message: String) {
        let data = StructuredEventData::WeaponUsed { actor, weapon };
        self.push(CombatLogEventType::WeaponUsed, message, Some(data));
    }

    /// Flag the latest damage entry on `target` as the killing blow.
    pub fn mark_killing_blow(&mut self, target: &str) -> bool {
        let latest = self.entries.iter_mut().rev().find_map(|entry| match &mut entry.data {
            Some(StructuredEventData::Damage {
                target: hit,
                is_killing_blow,
                ..
            }) if hit.as_str() == target => Some(is_killing_blow),
            _ => None,
        });
        match latest {
            Some(flag) => {
                *flag = true;
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    fn damage_entries(&self) -> impl Iterator<Item = (&str, &str, &str, f32, bool)> {
        self.entries.iter().filter_map(|e| match &e.data {
            Some(StructuredEventData::Damage {
                source,
                target,
                weapon,
                amount,
                is_killing_blow,
            }) => Some((
                source.as_str(),
                target.as_str(),
                weapon.as_str(),
                *amount,
                *is_killing_blow,
            )),
            _ => None,
        })
    }

    /// Total damage dealt by each source.
    pub fn damage_by_instigator(&self) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for (source, _, _, amount, _) in self.damage_entries() {
            *totals.entry(source.to_string()).or_insert(0.0) += amount;
        }
        totals
    }

    /// Damage `source` dealt, per weapon.
    pub fn damage_by_weapon(&self, source: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for (from, _, weapon, amount, _) in self.damage_entries() {
            if from == source {
                *totals.entry(weapon.to_string()).or_insert(0.0) += amount;
            }
        }
        totals
    }

    pub fn damage_taken(&self, target: &str) -> f32 {
        self.damage_entries()
            .filter(|(_, hit, _, _, _)| *hit == target)
            .map(|(_, _, _, amount, _)| amount)
            .sum()
    }

    pub fn killing_blows(&self, source: &str) -> usize {
        self.damage_entries()
            .filter(|(from, _, _, _, killing)| *from == source && *killing)
            .count()
    }

    /// Names of actors that died, in order.
    pub fn deaths(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match &e.data {
                Some(StructuredEventData::Death { target, .. }) => Some(target.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn shots_fired(&self, actor: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| {
                matches!(&e.data, Some(StructuredEventData::WeaponUsed { actor: shooter, .. }) if shooter == actor)
            })
            .count()
    }

    /// One line for display: `[  12.50s] message`.
    pub fn format_entry(entry: &CombatLogEntry) -> String {
        format!("[{:>7.2}s] {}", entry.timestamp, entry.message)
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Write metadata and entries as pretty JSON. Without `path`, a
    /// timestamped file under `match_logs/` is used. Returns the path written.
    pub fn save_to_file(&self, metadata: &MatchMetadata, path: Option<&str>) -> Result<String> {
        let path = match path {
            Some(path) => PathBuf::from(path),
            None => default_log_path(),
        };
        let shown = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let saved = SavedLog {
            metadata,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&saved).map_err(|source| ConfigError::Json {
            path: shown.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| ConfigError::Io {
            path: shown.clone(),
            source,
        })?;
        info!("Combat log written to {}", shown);
        Ok(shown)
    }
}

fn default_log_path() -> PathBuf {
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Path::new(DEFAULT_LOG_DIR).join(format!("match_{}.json", stamp))
}
