//! Integration tests for unit updates and skills
//!
//! These tests verify that:
//! - A ready skill pre-empts a normal attack when both are in range
//! - Each skill effect (pierce, charge, volley) does what its catalog says
//! - Stunned units neither move nor attack until the stun expires
//! - Team-wide modifiers feed into normal attacks

use bevy::math::Vec2;
use siegesim::battle::castle::Castle;
use siegesim::battle::components::{Category, GameRng, Team, UnitId};
use siegesim::battle::constants::{PLAYER_CASTLE_POS, TICK_SECS};
use siegesim::battle::modifiers::{RogueliteBuff, RogueliteModifierSet};
use siegesim::battle::skill_config::SkillCatalog;
use siegesim::battle::unit::{update_unit, CombatantSpec, UnitTable, UpdateContext};
use siegesim::combat::events::{BattleEvent, StatusKind};

/// Helper to spawn a unit with fixed stats
fn spawn(
    units: &mut UnitTable,
    catalog: &SkillCatalog,
    team: Team,
    category: Category,
    pos: (f32, f32),
) -> UnitId {
    let name = match team {
        Team::Player => "Guard",
        Team::Enemy => "Raider",
    };
    units.spawn(
        &CombatantSpec::new(name, category, 100.0, 20.0, 3.0),
        team,
        Vec2::new(pos.0, pos.1),
        catalog,
    )
}

/// Helper owning everything an update needs besides the unit table
struct World {
    modifiers: RogueliteModifierSet,
    player_castle: Castle,
    rng: GameRng,
    events: Vec<BattleEvent>,
}

impl World {
    fn new() -> Self {
        Self {
            modifiers: RogueliteModifierSet::new(),
            player_castle: Castle::new(Team::Player, Vec2::new(PLAYER_CASTLE_POS.0, PLAYER_CASTLE_POS.1)),
            rng: GameRng::from_seed(12345),
            events: Vec::new(),
        }
    }

    fn update(&mut self, units: &mut UnitTable, id: UnitId, dt: f32) -> u32 {
        let index = units.index_of(id).expect("unit should exist");
        let mut ctx = UpdateContext {
            dt,
            modifiers: &self.modifiers,
            player_castle: &mut self.player_castle,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        update_unit(units, index, &mut ctx)
    }
}

/// Catalog whose pierce skill always stuns
fn always_stun_catalog() -> SkillCatalog {
    SkillCatalog::from_ron_str(
        r#"(
            skills: {
                Pierce: (name: "Piercing Thrust", cooldown: 4.0, damage_multiplier: 1.5, range: 60.0,
                         effect: Pierce(stun_chance: 1.0, stun_duration: 1.0)),
                Charge: (name: "Cavalry Charge", cooldown: 5.0, damage_multiplier: 1.8, range: 80.0,
                         effect: Charge(slow_factor: 0.5, slow_duration: 2.0, self_heal_fraction: 0.25)),
                Ranged: (name: "Arrow Volley", cooldown: 3.5, damage_multiplier: 1.2, range: 100.0,
                         effect: Volley(arrow_count: 3, splash_range: 100.0, damage_factor: 0.8,
                                        slow_factor: 0.6, slow_duration: 1.5)),
            },
        )"#,
    )
    .expect("test catalog should parse")
}

// =============================================================================
// Skill Priority
// =============================================================================

#[test]
fn test_ready_skill_preempts_normal_attack() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let spear = spawn(&mut units, &catalog, Team::Player, Category::Pierce, (500.0, 300.0));
    let rider = spawn(&mut units, &catalog, Team::Enemy, Category::Charge, (500.0, 340.0));
    let mut world = World::new();

    let dealt = world.update(&mut units, spear, TICK_SECS);

    // Skill: 20 x 1.5 x 1.2 = 36. A normal attack would have dealt 24.
    assert_eq!(dealt, 36, "skill damage formula should apply, not the normal attack");
    assert_eq!(units.get(rider).unwrap().hp, 64.0);
    assert!(!units.get(spear).unwrap().skill_state.ready);
}

#[test]
fn test_normal_attack_when_skill_on_cooldown() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let spear = spawn(&mut units, &catalog, Team::Player, Category::Pierce, (500.0, 300.0));
    let rider = spawn(&mut units, &catalog, Team::Enemy, Category::Charge, (500.0, 340.0));
    units.get_mut(spear).unwrap().skill_state.start(10.0);
    let mut world = World::new();

    let dealt = world.update(&mut units, spear, TICK_SECS);

    assert_eq!(dealt, 24);
    assert_eq!(units.get(rider).unwrap().hp, 76.0);
}

#[test]
fn test_out_of_range_deals_nothing() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let spear = spawn(&mut units, &catalog, Team::Player, Category::Pierce, (500.0, 300.0));
    let archer = spawn(&mut units, &catalog, Team::Enemy, Category::Ranged, (500.0, 450.0));
    let mut world = World::new();

    assert_eq!(world.update(&mut units, spear, TICK_SECS), 0);
    assert_eq!(
        units.get(spear).unwrap().target_enemy,
        Some(archer),
        "target is acquired even when out of range"
    );
}

// =============================================================================
// Skill Effects
// =============================================================================

#[test]
fn test_pierce_stun_applied() {
    let catalog = always_stun_catalog();
    let mut units = UnitTable::new();
    let spear = spawn(&mut units, &catalog, Team::Player, Category::Pierce, (500.0, 300.0));
    let rider = spawn(&mut units, &catalog, Team::Enemy, Category::Charge, (500.0, 340.0));
    let mut world = World::new();

    world.update(&mut units, spear, TICK_SECS);

    let target = units.get(rider).unwrap();
    assert!(target.status.stunned);
    assert_eq!(target.status.stun_timer, 1.0);
    assert!(world.events.iter().any(|e| matches!(
        e,
        BattleEvent::StatusApplied(s) if s.kind == StatusKind::Stun
    )));
}

#[test]
fn test_charge_slows_target_and_heals_caster() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let rider = spawn(&mut units, &catalog, Team::Player, Category::Charge, (500.0, 300.0));
    let archer = spawn(&mut units, &catalog, Team::Enemy, Category::Ranged, (500.0, 370.0));
    units.get_mut(rider).unwrap().hp = 50.0;
    let mut world = World::new();

    let dealt = world.update(&mut units, rider, TICK_SECS);

    // 20 x 1.8 x 1.2 = 43.2
    assert_eq!(dealt, 43);
    let target = units.get(archer).unwrap();
    assert!((target.hp - 56.8).abs() < 1e-3);
    assert_eq!(target.status.slow_factor, 0.5);
    assert_eq!(units.get(rider).unwrap().hp, 75.0, "caster heals 25% of max hp");
}

#[test]
fn test_volley_hits_at_most_three_enemies() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let archer = spawn(&mut units, &catalog, Team::Player, Category::Ranged, (500.0, 300.0));
    let a = spawn(&mut units, &catalog, Team::Enemy, Category::Pierce, (500.0, 380.0));
    let b = spawn(&mut units, &catalog, Team::Enemy, Category::Pierce, (560.0, 380.0));
    let c = spawn(&mut units, &catalog, Team::Enemy, Category::Pierce, (440.0, 400.0));
    let d = spawn(&mut units, &catalog, Team::Enemy, Category::Pierce, (500.0, 470.0));
    let mut world = World::new();

    world.update(&mut units, archer, TICK_SECS);

    // 20 x 1.2 x 1.2 x 0.8 = 23.04 per arrow
    for id in [a, b, c] {
        let unit = units.get(id).unwrap();
        assert!((unit.hp - 76.96).abs() < 1e-3, "{} should be hit", unit.id);
        assert_eq!(unit.status.slow_factor, 0.6);
    }
    let spared = units.get(d).unwrap();
    assert_eq!(spared.hp, 100.0, "fourth enemy exceeds the arrow count");
    assert!(!spared.status.is_slowed());
}

#[test]
fn test_cooldown_buff_shortens_skill_cooldown() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let spear = spawn(&mut units, &catalog, Team::Player, Category::Pierce, (500.0, 300.0));
    spawn(&mut units, &catalog, Team::Enemy, Category::Charge, (500.0, 340.0));
    let mut world = World::new();
    world.modifiers.apply_buff(RogueliteBuff::Cooldown);

    world.update(&mut units, spear, TICK_SECS);

    let remaining = units.get(spear).unwrap().skill_state.cooldown_remaining;
    assert!((remaining - 2.4).abs() < 1e-4, "4.0s x 0.6 = 2.4s, got {}", remaining);
}

// =============================================================================
// Stun
// =============================================================================

#[test]
fn test_stunned_unit_does_not_move_or_attack() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let spear = spawn(&mut units, &catalog, Team::Player, Category::Pierce, (500.0, 300.0));
    let rider = spawn(&mut units, &catalog, Team::Enemy, Category::Charge, (500.0, 340.0));
    {
        let unit = units.get_mut(spear).unwrap();
        unit.status.apply_stun(0.5);
        unit.target_position = Some(Vec2::new(700.0, 300.0));
    }
    let mut world = World::new();

    assert_eq!(world.update(&mut units, spear, 0.25), 0);
    let unit = units.get(spear).unwrap();
    assert_eq!(unit.position, Vec2::new(500.0, 300.0), "stunned unit must not move");
    assert_eq!(units.get(rider).unwrap().hp, 100.0);

    // Stun runs out during this update; the move order is dropped
    let dealt = world.update(&mut units, spear, 0.25);
    let unit = units.get(spear).unwrap();
    assert!(!unit.status.stunned);
    assert!(unit.target_position.is_none());
    assert!(dealt > 0, "unit acts again once the stun has expired");
}

// =============================================================================
// Modifiers on Normal Attacks
// =============================================================================

#[test]
fn test_armor_reduces_enemy_hit() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let guard = spawn(&mut units, &catalog, Team::Player, Category::Charge, (500.0, 340.0));
    let spear = spawn(&mut units, &catalog, Team::Enemy, Category::Pierce, (500.0, 300.0));
    units.get_mut(spear).unwrap().skill_state.start(10.0);
    let mut world = World::new();
    world.modifiers.apply_buff(RogueliteBuff::Armor);

    world.update(&mut units, spear, TICK_SECS);

    // 20 x 1.2 = 24, x 0.75 = 18
    assert!((units.get(guard).unwrap().hp - 82.0).abs() < 1e-4);
}

#[test]
fn test_lifesteal_heals_player_castle() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let guard = spawn(&mut units, &catalog, Team::Player, Category::Pierce, (500.0, 300.0));
    let raider = spawn(&mut units, &catalog, Team::Enemy, Category::Pierce, (500.0, 340.0));
    units.get_mut(guard).unwrap().skill_state.start(10.0);
    let mut world = World::new();
    world.modifiers.apply_buff(RogueliteBuff::Crit);
    world.modifiers.apply_buff(RogueliteBuff::Lifesteal);
    world.player_castle.hp = 400.0;

    world.update(&mut units, guard, TICK_SECS);

    let damage = 100.0 - units.get(raider).unwrap().hp;
    assert!(damage == 20.0 || damage == 30.0, "plain or critical hit, got {}", damage);
    assert!((world.player_castle.hp - (400.0 + damage * 0.15)).abs() < 1e-4);
}

#[test]
fn test_inert_unit_is_never_processed() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let guard = spawn(&mut units, &catalog, Team::Player, Category::Pierce, (500.0, 300.0));
    let raider = spawn(&mut units, &catalog, Team::Enemy, Category::Charge, (500.0, 340.0));
    {
        let unit = units.get_mut(guard).unwrap();
        unit.hp = 0.0;
        unit.target_position = Some(Vec2::new(500.0, 200.0));
    }
    let mut world = World::new();

    assert_eq!(world.update(&mut units, guard, TICK_SECS), 0);
    assert_eq!(units.get(guard).unwrap().position, Vec2::new(500.0, 300.0));
    assert_eq!(units.get(raider).unwrap().hp, 100.0);
}

#[test]
fn test_manual_target_kept_while_alive() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let archer = spawn(&mut units, &catalog, Team::Player, Category::Ranged, (500.0, 300.0));
    spawn(&mut units, &catalog, Team::Enemy, Category::Pierce, (500.0, 330.0));
    let far = spawn(&mut units, &catalog, Team::Enemy, Category::Pierce, (600.0, 300.0));
    units.get_mut(archer).unwrap().target_enemy = Some(far);
    let mut world = World::new();

    world.update(&mut units, archer, TICK_SECS);
    assert_eq!(units.get(archer).unwrap().target_enemy, Some(far));

    units.get_mut(far).unwrap().hp = 0.0;
    world.update(&mut units, archer, TICK_SECS);
    assert_ne!(
        units.get(archer).unwrap().target_enemy,
        Some(far),
        "dead target is replaced by the nearest living enemy"
    );
}

// =============================================================================
// Regeneration
// =============================================================================

#[test]
fn test_hp_recovery_specialization_regenerates_up_to_max() {
    let catalog = SkillCatalog::default();
    let mut units = UnitTable::new();
    let zhang_fei = units.spawn(
        &CombatantSpec::new("Zhang Fei", Category::Pierce, 100.0, 20.0, 3.0),
        Team::Player,
        Vec2::new(500.0, 300.0),
        &catalog,
    );
    let guard = spawn(&mut units, &catalog, Team::Player, Category::Pierce, (300.0, 300.0));
    units.get_mut(zhang_fei).unwrap().hp = 50.0;
    units.get_mut(guard).unwrap().hp = 50.0;
    let mut world = World::new();

    // 10% of max hp per second
    world.update(&mut units, zhang_fei, 1.0);
    assert!((units.get(zhang_fei).unwrap().hp - 60.0).abs() < 1e-3);
    assert!(world.events.iter().any(|e| matches!(
        e,
        BattleEvent::Healing(heal) if heal.cause == "Regeneration"
    )));

    units.get_mut(zhang_fei).unwrap().hp = 95.0;
    world.update(&mut units, zhang_fei, 1.0);
    assert_eq!(units.get(zhang_fei).unwrap().hp, 100.0, "capped at max hp");

    world.update(&mut units, guard, 1.0);
    assert_eq!(units.get(guard).unwrap().hp, 50.0, "no specialization, no regeneration");
}
