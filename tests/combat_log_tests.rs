//! Unit tests for combat log recording, queries and persistence
//!
//! These tests verify that the CombatLog correctly:
//! - Describes recorded events with stable message formats
//! - Separates unit damage from castle (siege) damage
//! - Aggregates damage by ability and source
//! - Saves a JSON file with metadata and entries

use regex::Regex;
use siegesim::battle::components::{Team, UnitId};
use siegesim::combat::events::{
    BattleEvent, DamageEvent, HealingEvent, HitTarget, UnitDeathEvent,
};
use siegesim::combat::log::{BattleMetadata, CombatLog, CombatLogEventType};
use siegesim::BattleOutcome;

fn create_test_log() -> CombatLog {
    CombatLog::default()
}

/// Helper to build a hit from `source` on a unit
fn hit(source: &str, target: &str, ability: Option<&str>, amount: f32, crit: bool) -> BattleEvent {
    BattleEvent::Damage(DamageEvent {
        source: Some(UnitId(0)),
        source_name: source.to_string(),
        target: HitTarget::Unit(UnitId(1)),
        target_name: target.to_string(),
        amount,
        ability_name: ability.map(str::to_string),
        is_critical: crit,
    })
}

fn siege(source: &str, amount: f32) -> BattleEvent {
    BattleEvent::Damage(DamageEvent {
        source: Some(UnitId(0)),
        source_name: source.to_string(),
        target: HitTarget::Castle(Team::Enemy),
        target_name: "Enemy Castle".to_string(),
        amount,
        ability_name: Some("Siege".to_string()),
        is_critical: false,
    })
}

fn metadata() -> BattleMetadata {
    BattleMetadata {
        stage_name: "First Campaign".to_string(),
        chapter: 1,
        outcome: "Victory".to_string(),
        waves_reached: 3,
        max_waves: 8,
        elapsed_secs: 42.0,
        player_castle_hp: 450.0,
        enemy_castle_hp: 0.0,
        random_seed: Some(7),
        units: Vec::new(),
    }
}

// =============================================================================
// Message Format Tests
// =============================================================================

#[test]
fn test_damage_message_format() {
    let mut log = create_test_log();
    log.record(&hit("Guan Yu", "Enemy Spear (wave 1)", None, 24.0, false));
    log.record(&hit("Guan Yu", "Enemy Spear (wave 1)", Some("Piercing Thrust"), 36.4, true));

    let pattern = Regex::new(r"^(.+)'s (.+) hits (.+) for (\d+) damage( \(Critical\))?$").unwrap();
    let first = pattern.captures(&log.entries[0].message).expect("normal hit matches");
    assert_eq!(&first[2], "Attack");
    assert_eq!(&first[4], "24");
    assert!(first.get(5).is_none());

    let second = pattern.captures(&log.entries[1].message).expect("skill hit matches");
    assert_eq!(&second[2], "Piercing Thrust");
    assert_eq!(&second[4], "36");
    assert!(second.get(5).is_some(), "critical hits are flagged");
}

#[test]
fn test_death_and_wave_messages() {
    let mut log = create_test_log();
    log.record(&BattleEvent::UnitDied(UnitDeathEvent {
        victim: UnitId(4),
        victim_name: "Enemy Bow (wave 2)".to_string(),
        killer_name: "Ma Chao".to_string(),
    }));
    log.record(&BattleEvent::WaveSpawned {
        wave: 3,
        enemy_count: 2,
    });
    log.record(&BattleEvent::BossPhaseChanged { from: 1, to: 2 });
    log.record(&BattleEvent::BattleEnded {
        outcome: BattleOutcome::StageComplete,
    });

    assert_eq!(log.entries[0].message, "Enemy Bow (wave 2) has been slain by Ma Chao");
    assert_eq!(log.entries[1].message, "Wave 3 begins with 2 enemies");
    assert!(Regex::new(r"phase 2 \(was phase 1\)").unwrap().is_match(&log.entries[2].message));
    assert_eq!(log.entries[3].event_type, CombatLogEventType::MatchEvent);
}

// =============================================================================
// Filtering Tests
// =============================================================================

#[test]
fn test_castle_hits_logged_as_siege() {
    let mut log = create_test_log();
    log.record(&hit("Huang Zhong", "Enemy Spear (wave 1)", None, 20.0, false));
    log.record(&siege("Huang Zhong", 21.0));

    assert_eq!(log.filter_by_type(CombatLogEventType::Damage).len(), 1);
    assert_eq!(log.filter_by_type(CombatLogEventType::Siege).len(), 1);
}

#[test]
fn test_hp_changes_only_skips_other_events() {
    let mut log = create_test_log();
    log.record(&hit("A", "B", None, 10.0, false));
    log.record(&BattleEvent::Healing(HealingEvent {
        target: HitTarget::Castle(Team::Player),
        target_name: "Player Castle".to_string(),
        amount: 3.0,
        cause: "Lifesteal".to_string(),
    }));
    log.record(&BattleEvent::WaveSpawned {
        wave: 1,
        enemy_count: 3,
    });
    log.log(CombatLogEventType::MatchEvent, "Battle started".to_string());

    assert_eq!(log.hp_changes_only().len(), 2);
    assert_eq!(log.recent(1)[0].message, "Battle started");
}

// =============================================================================
// Damage Aggregation Tests
// =============================================================================

#[test]
fn test_damage_by_ability_empty_log() {
    let log = create_test_log();
    assert!(log.damage_by_ability("Guan Yu").is_empty());
}

#[test]
fn test_damage_by_ability_groups_by_skill() {
    let mut log = create_test_log();
    log.record(&hit("Guan Yu", "X", None, 24.0, false));
    log.record(&hit("Guan Yu", "X", None, 36.0, true));
    log.record(&hit("Guan Yu", "X", Some("Piercing Thrust"), 36.0, false));
    log.record(&siege("Guan Yu", 18.0));
    log.record(&hit("Ma Chao", "X", None, 99.0, false));

    let damage = log.damage_by_ability("Guan Yu");
    assert_eq!(damage.len(), 3, "Attack, Piercing Thrust and Siege");
    assert_eq!(damage["Attack"], 60.0);
    assert_eq!(damage["Piercing Thrust"], 36.0);
    assert_eq!(damage["Siege"], 18.0);
    assert_eq!(log.total_damage_by("Guan Yu"), 114.0);
    assert_eq!(log.total_damage_by("Nobody"), 0.0);
}

#[test]
fn test_timestamps_follow_match_time() {
    let mut log = create_test_log();
    log.match_time = 1.5;
    log.record(&hit("A", "B", None, 10.0, false));
    log.match_time = 3.0;
    log.record(&hit("A", "B", None, 10.0, false));

    assert_eq!(log.entries[0].timestamp, 1.5);
    assert_eq!(log.entries[1].timestamp, 3.0);

    log.clear();
    assert!(log.entries.is_empty());
    assert_eq!(log.match_time, 0.0);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_save_to_file_writes_metadata_and_entries() {
    let mut log = create_test_log();
    log.record(&hit("Guan Yu", "Enemy Spear (wave 1)", None, 24.0, false));
    log.record(&siege("Guan Yu", 18.0));

    let dir = std::env::temp_dir().join("siegesim_log_test");
    let path = dir.join("nested").join("battle.json");
    let written = log
        .save_to_file(&metadata(), Some(path.to_str().unwrap()))
        .expect("save should succeed");
    assert_eq!(written, path.to_str().unwrap());

    let contents = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(json["metadata"]["stage_name"], "First Campaign");
    assert_eq!(json["metadata"]["random_seed"], 7);
    assert_eq!(json["entries"].as_array().unwrap().len(), 2);
    assert_eq!(json["entries"][1]["event_type"], "Siege");

    let _ = std::fs::remove_dir_all(&dir);
}
