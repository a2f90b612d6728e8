//! Castles and the boss phase machine
//!
//! A castle is a stationary objective. The enemy castle of a boss stage also
//! carries a `BossState`: a phase derived from hp thresholds that only ever
//! advances, and an ability cooldown that fires the ability bound to the
//! current phase.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::combat::events::{BattleEvent, DamageEvent, HitTarget, UnitDeathEvent};

use super::components::{GameRng, Team, UnitId};
use super::constants::{
    BOSS_MAX_HP, BOSS_PHASE_THREE_HP, BOSS_PHASE_TWO_HP, CASTLE_MAX_HP, EXECUTE_DAMAGE_MULTIPLIER,
};
use super::stage_config::{BossAbilityConfig, BossAbilityEffect, BossConfig};
use super::unit::UnitTable;

/// Boss phase. Ordered so that later phases compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BossPhase {
    One,
    Two,
    Three,
}

impl BossPhase {
    /// Phase implied by the boss's current hp.
    pub fn from_hp(hp: f32) -> BossPhase {
        if hp <= BOSS_PHASE_THREE_HP {
            BossPhase::Three
        } else if hp <= BOSS_PHASE_TWO_HP {
            BossPhase::Two
        } else {
            BossPhase::One
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            BossPhase::One => 1,
            BossPhase::Two => 2,
            BossPhase::Three => 3,
        }
    }

    fn next(&self) -> Option<BossPhase> {
        match self {
            BossPhase::One => Some(BossPhase::Two),
            BossPhase::Two => Some(BossPhase::Three),
            BossPhase::Three => None,
        }
    }
}

/// A single threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    pub from: BossPhase,
    pub to: BossPhase,
}

#[derive(Debug, Clone, Serialize)]
pub struct BossState {
    phase: BossPhase,
    /// Seconds until the next ability
    pub ability_cooldown: f32,
    /// Crossings not yet acknowledged by the presentation layer
    pending: Vec<PhaseTransition>,
}

impl Default for BossState {
    fn default() -> Self {
        Self {
            phase: BossPhase::One,
            ability_cooldown: 0.0,
            pending: Vec::new(),
        }
    }
}

impl BossState {
    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    /// Advance the phase to match `hp`. Returns only crossings that have not
    /// fired before; calling again with the same or higher hp returns nothing.
    pub fn update_phase(&mut self, hp: f32) -> SmallVec<[PhaseTransition; 2]> {
        let target = BossPhase::from_hp(hp);
        let mut fired = SmallVec::new();
        while self.phase < target {
            let Some(next) = self.phase.next() else {
                break;
            };
            let transition = PhaseTransition {
                from: self.phase,
                to: next,
            };
            self.phase = next;
            self.pending.push(transition);
            fired.push(transition);
        }
        fired
    }

    /// Transitions waiting to be acknowledged, oldest first.
    pub fn pending_transitions(&self) -> &[PhaseTransition] {
        &self.pending
    }

    /// Mark every pending transition as handled.
    pub fn acknowledge_transitions(&mut self) -> Vec<PhaseTransition> {
        std::mem::take(&mut self.pending)
    }
}

/// A stationary objective.
#[derive(Debug, Clone)]
pub struct Castle {
    pub team: Team,
    pub position: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub boss: Option<BossState>,
}

impl Castle {
    pub fn new(team: Team, position: Vec2) -> Self {
        Self {
            team,
            position,
            hp: CASTLE_MAX_HP,
            max_hp: CASTLE_MAX_HP,
            boss: None,
        }
    }

    pub fn new_boss(team: Team, position: Vec2) -> Self {
        Self {
            team,
            position,
            hp: BOSS_MAX_HP,
            max_hp: BOSS_MAX_HP,
            boss: Some(BossState::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        match (self.team, self.boss.is_some()) {
            (Team::Player, _) => "Player Castle",
            (Team::Enemy, true) => "Boss Fortress",
            (Team::Enemy, false) => "Enemy Castle",
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn boss_phase(&self) -> Option<BossPhase> {
        self.boss.as_ref().map(BossState::phase)
    }

    /// Subtract hp, clamping at zero. Returns the amount applied.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let applied = amount.max(0.0).min(self.hp);
        self.hp -= applied;
        applied
    }

    /// Restore hp up to max. Returns the amount healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.is_destroyed() {
            return 0.0;
        }
        let healed = amount.max(0.0).min(self.max_hp - self.hp);
        self.hp += healed;
        healed
    }
}

/// Run one tick of boss logic: phase transitions, then the ability cooldown.
/// Does nothing for castles without a boss.
pub fn update_boss(
    castle: &mut Castle,
    config: &BossConfig,
    units: &mut UnitTable,
    dt: f32,
    rng: &mut GameRng,
    events: &mut Vec<BattleEvent>,
) {
    if castle.is_destroyed() {
        return;
    }
    let hp = castle.hp;
    let Some(boss) = castle.boss.as_mut() else {
        return;
    };

    boss.update_phase(hp);
    for transition in boss.acknowledge_transitions() {
        info!("{} enters phase {}", config.name, transition.to.number());
        events.push(BattleEvent::BossPhaseChanged {
            from: transition.from.number(),
            to: transition.to.number(),
        });
    }

    boss.ability_cooldown -= dt;
    if boss.ability_cooldown > 0.0 {
        return;
    }

    let Some(ability) = config.ability_for(boss.phase()) else {
        warn!("{} has no ability for phase {}", config.name, boss.phase().number());
        boss.ability_cooldown = 0.0;
        return;
    };
    let targets_hit = execute_ability(ability, config, units, rng, events);
    boss.ability_cooldown = ability.cooldown;

    events.push(BattleEvent::BossAbility {
        ability_name: ability.name.clone(),
        targets_hit,
    });
}

fn execute_ability(
    ability: &BossAbilityConfig,
    config: &BossConfig,
    units: &mut UnitTable,
    rng: &mut GameRng,
    events: &mut Vec<BattleEvent>,
) -> usize {
    let damage = config.base_attack * ability.damage_factor;
    let living: Vec<_> = units.living_on(Team::Player).map(|unit| unit.id).collect();

    let hits: Vec<(UnitId, f32)> = match ability.effect {
        BossAbilityEffect::Single => rng
            .random_index(living.len())
            .map(|index| vec![(living[index], damage)])
            .unwrap_or_default(),
        BossAbilityEffect::Aoe => living.iter().map(|id| (*id, damage)).collect(),
        BossAbilityEffect::Execute { threshold } => living
            .iter()
            .filter(|id| {
                units
                    .get(**id)
                    .map_or(false, |unit| unit.hp / unit.max_hp < threshold)
            })
            .map(|id| (*id, damage * EXECUTE_DAMAGE_MULTIPLIER))
            .collect(),
    };

    for (id, amount) in &hits {
        let Some(unit) = units.get_mut(*id) else {
            continue;
        };
        let (applied, died) = unit.take_damage(*amount);
        events.push(BattleEvent::Damage(DamageEvent {
            source: None,
            source_name: config.name.clone(),
            target: HitTarget::Unit(unit.id),
            target_name: unit.name.clone(),
            amount: applied,
            ability_name: Some(ability.name.clone()),
            is_critical: false,
        }));
        if died {
            events.push(BattleEvent::UnitDied(UnitDeathEvent {
                victim: unit.id,
                victim_name: unit.name.clone(),
                killer_name: config.name.clone(),
            }));
        }
    }

    hits.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_from_hp_thresholds() {
        assert_eq!(BossPhase::from_hp(1500.0), BossPhase::One);
        assert_eq!(BossPhase::from_hp(1000.1), BossPhase::One);
        assert_eq!(BossPhase::from_hp(1000.0), BossPhase::Two);
        assert_eq!(BossPhase::from_hp(500.1), BossPhase::Two);
        assert_eq!(BossPhase::from_hp(500.0), BossPhase::Three);
        assert_eq!(BossPhase::from_hp(0.0), BossPhase::Three);
    }

    #[test]
    fn test_each_crossing_fires_once() {
        let mut boss = BossState::default();
        assert_eq!(boss.update_phase(900.0).len(), 1);
        assert!(boss.update_phase(900.0).is_empty(), "no repeat before acknowledgement");
        assert!(boss.update_phase(800.0).is_empty());
        assert_eq!(boss.pending_transitions().len(), 1);

        let acknowledged = boss.acknowledge_transitions();
        assert_eq!(acknowledged[0].to, BossPhase::Two);
        assert!(boss.pending_transitions().is_empty());
    }

    #[test]
    fn test_double_crossing_in_one_update() {
        let mut boss = BossState::default();
        let fired = boss.update_phase(100.0);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].to, BossPhase::Two);
        assert_eq!(fired[1].to, BossPhase::Three);
    }

    #[test]
    fn test_phase_never_regresses() {
        let mut boss = BossState::default();
        boss.update_phase(400.0);
        assert!(boss.update_phase(1500.0).is_empty());
        assert_eq!(boss.phase(), BossPhase::Three);
    }

    #[test]
    fn test_castle_heal_capped_and_damage_clamped() {
        let mut castle = Castle::new(Team::Player, Vec2::ZERO);
        assert_eq!(castle.heal(10.0), 0.0);
        castle.take_damage(600.0);
        assert_eq!(castle.hp, 0.0);
        assert!(castle.is_destroyed());
    }
}
