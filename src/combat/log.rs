//! Combat logging
//!
//! Records all battle events for display and post-battle analysis.

use bevy::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use super::events::{BattleEvent, DamageEvent};

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize)]
pub struct CombatLogEntry {
    /// Timestamp in battle time (seconds since battle start)
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    /// Damage details, kept for aggregation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<DamageEvent>,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CombatLogEventType {
    /// Damage dealt to a unit
    Damage,
    /// Damage dealt to a castle
    Siege,
    /// Healing done
    Healing,
    /// Skill activated
    SkillUsed,
    /// Stun or slow applied
    Status,
    /// Unit died
    Death,
    /// Boss phase change or ability
    Boss,
    /// Wave spawned or preparation started
    Wave,
    /// Between-wave event applied
    WaveEvent,
    /// Shop purchase or refresh
    Shop,
    /// Battle event (start, end, etc.)
    MatchEvent,
}

/// Per-unit summary written alongside the log
#[derive(Debug, Clone, Serialize)]
pub struct UnitMetadata {
    pub name: String,
    pub team: String,
    pub category: String,
    pub max_hp: f32,
    pub final_hp: f32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub final_position: (f32, f32),
}

/// Battle summary written alongside the log
#[derive(Debug, Clone, Serialize)]
pub struct BattleMetadata {
    pub stage_name: String,
    pub chapter: u32,
    pub outcome: String,
    pub waves_reached: u32,
    pub max_waves: u32,
    pub elapsed_secs: f32,
    pub player_castle_hp: f32,
    pub enemy_castle_hp: f32,
    pub random_seed: Option<u64>,
    pub units: Vec<UnitMetadata>,
}

#[derive(Serialize)]
struct SavedLog<'a> {
    metadata: &'a BattleMetadata,
    entries: &'a [CombatLogEntry],
}

/// The combat log storing all events
#[derive(Debug, Clone, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current battle time
    pub match_time: f32,
}

impl CombatLog {
    /// Clear the log for a new battle
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
            damage: None,
        });
    }

    /// Record a battle event
    pub fn record(&mut self, event: &BattleEvent) {
        let damage = match event {
            BattleEvent::Damage(damage) => Some(damage.clone()),
            _ => None,
        };
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type: event.log_type(),
            message: event.describe(),
            damage,
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage, siege and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage
                        | CombatLogEventType::Siege
                        | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Damage dealt by a named source, keyed by ability ("Attack" for normal hits)
    pub fn damage_by_ability(&self, source_name: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for damage in self.entries.iter().filter_map(|e| e.damage.as_ref()) {
            if damage.source_name != source_name {
                continue;
            }
            let ability = damage
                .ability_name
                .clone()
                .unwrap_or_else(|| "Attack".to_string());
            *totals.entry(ability).or_insert(0.0) += damage.amount;
        }
        totals
    }

    /// Total damage dealt by a named source
    pub fn total_damage_by(&self, source_name: &str) -> f32 {
        self.damage_by_ability(source_name).values().sum()
    }

    /// Save the log and battle summary as pretty JSON.
    ///
    /// Without an explicit path the file goes to `battle_logs/battle_<unix secs>.json`.
    /// Returns the path written.
    pub fn save_to_file(
        &self,
        metadata: &BattleMetadata,
        output_path: Option<&str>,
    ) -> Result<String, String> {
        let path = match output_path {
            Some(path) => path.to_string(),
            None => {
                let secs = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                format!("battle_logs/battle_{}.json", secs)
            }
        };

        if let Some(parent) = Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
            }
        }

        let saved = SavedLog {
            metadata,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&saved)
            .map_err(|e| format!("Failed to serialize combat log: {}", e))?;
        std::fs::write(&path, json).map_err(|e| format!("Failed to write {}: {}", path, e))?;

        info!("Combat log saved ({} entries) to {}", self.entries.len(), path);
        Ok(path)
    }
}
