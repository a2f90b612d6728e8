//! Units and the per-tick unit update
//!
//! A unit is a mobile combatant owned by the battle's `UnitTable`. Units refer
//! to each other only through `UnitId` handles, which are resolved and
//! liveness-checked every time they are used.
//!
//! The update order is significant:
//! 1. skill cooldown decay
//! 2. stun decay (expiry drops the move order)
//! 3. slow decay
//! 4. stunned units stop here
//! 5. movement toward the move order
//! 6. arena clamp
//! 7. target acquisition (only when the current target is missing or dead)
//! 8. passive regeneration
//! 9. skill, if ready and in skill range
//! 10. otherwise a normal attack, if in attack range

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::events::{
    BattleEvent, DamageEvent, HealingEvent, HitTarget, SkillUsedEvent, StatusAppliedEvent,
    StatusKind, UnitDeathEvent,
};

use super::castle::Castle;
use super::combat_core::{resolve_strike, skill_damage, type_advantage, StrikeInput};
use super::components::{clamp_to_arena, Category, GameRng, Team, UnitId};
use super::constants::{PLAYER_TEAM_STAT_BONUS, SIEGE_ATTACK_FRACTION, TICK_SECS};
use super::modifiers::RogueliteModifierSet;
use super::skill_config::{SkillCatalog, SkillDefinition, SkillEffect, SpecializationModifiers};
use super::status::StatusState;

/// External description of a combatant (roster entry, friend assist, or a
/// wave enemy before spawning).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSpec {
    pub name: String,
    pub category: Category,
    pub hp: f32,
    pub attack: f32,
    pub speed: f32,
}

impl CombatantSpec {
    pub fn new(name: impl Into<String>, category: Category, hp: f32, attack: f32, speed: f32) -> Self {
        Self {
            name: name.into(),
            category,
            hp,
            attack,
            speed,
        }
    }

    /// Roster entries fight slightly above their listed stats.
    pub fn with_player_bonus(&self) -> Self {
        Self {
            hp: (self.hp * PLAYER_TEAM_STAT_BONUS).floor().max(1.0),
            attack: (self.attack * PLAYER_TEAM_STAT_BONUS).floor().max(1.0),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.hp < 1.0 || self.attack <= 0.0 || self.speed <= 0.0 {
            return Err(format!(
                "'{}' needs at least 1 hp and positive attack and speed (got {}, {}, {})",
                self.name, self.hp, self.attack, self.speed
            ));
        }
        Ok(())
    }
}

/// Skill readiness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkillState {
    pub cooldown_remaining: f32,
    pub ready: bool,
}

impl Default for SkillState {
    fn default() -> Self {
        Self {
            cooldown_remaining: 0.0,
            ready: true,
        }
    }
}

impl SkillState {
    pub fn decay(&mut self, dt: f32) {
        if self.ready {
            return;
        }
        self.cooldown_remaining -= dt;
        if self.cooldown_remaining <= 0.0 {
            self.cooldown_remaining = 0.0;
            self.ready = true;
        }
    }

    pub fn start(&mut self, cooldown: f32) {
        self.cooldown_remaining = cooldown;
        self.ready = false;
    }
}

/// A mobile combatant.
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub team: Team,
    pub category: Category,
    pub position: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub attack: f32,
    /// Damage dealt to the opposing castle per siege tick, fixed at creation.
    pub siege_attack: f32,
    /// Arena units per reference tick.
    pub move_speed: f32,
    pub target_position: Option<Vec2>,
    pub target_enemy: Option<UnitId>,
    /// Per-unit copy of the category skill, scaled by specialization.
    pub skill: SkillDefinition,
    pub skill_state: SkillState,
    pub status: StatusState,
    pub specialization: SpecializationModifiers,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

impl Unit {
    /// Build a unit from its description. Specialization bonuses are looked up
    /// by name and applied once here.
    pub fn new(
        id: UnitId,
        spec: &CombatantSpec,
        team: Team,
        position: Vec2,
        catalog: &SkillCatalog,
    ) -> Self {
        let specialization: SpecializationModifiers = catalog
            .specialization_for(&spec.name)
            .map(Into::into)
            .unwrap_or_default();

        let mut skill = catalog.skill_for(spec.category).clone();
        skill.cooldown *= specialization.skill_cooldown_scale;
        skill.damage_multiplier *= specialization.skill_damage_scale;

        Self {
            id,
            name: spec.name.clone(),
            team,
            category: spec.category,
            position: clamp_to_arena(position),
            hp: spec.hp.max(1.0),
            max_hp: spec.hp.max(1.0),
            attack: (spec.attack * specialization.damage).floor(),
            siege_attack: (spec.attack * SIEGE_ATTACK_FRACTION).floor(),
            move_speed: spec.speed * specialization.speed,
            target_position: None,
            target_enemy: None,
            skill,
            skill_state: SkillState::default(),
            status: StatusState::default(),
            specialization,
            damage_dealt: 0.0,
            damage_taken: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    pub fn attack_range(&self) -> f32 {
        self.category.attack_range()
    }

    /// Subtract damage, clamping at zero. Returns (damage applied, died now).
    pub fn take_damage(&mut self, amount: f32) -> (f32, bool) {
        if !self.is_alive() {
            return (0.0, false);
        }
        let applied = amount.max(0.0).min(self.hp);
        self.hp -= applied;
        self.damage_taken += applied;
        (applied, !self.is_alive())
    }

    /// Restore hp up to max. Inert units are never revived. Returns the amount healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }
        let healed = amount.max(0.0).min(self.max_hp - self.hp);
        self.hp += healed;
        healed
    }
}

/// Storage for every unit in a battle. Handles are issued sequentially and
/// never reused.
#[derive(Debug, Clone, Default)]
pub struct UnitTable {
    units: Vec<Unit>,
    next_id: u32,
}

impl UnitTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(
        &mut self,
        spec: &CombatantSpec,
        team: Team,
        position: Vec2,
        catalog: &SkillCatalog,
    ) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        self.units.push(Unit::new(id, spec, team, position, catalog));
        id
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn index_of(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|unit| unit.id == id)
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.id == id)
    }

    /// Resolve a handle to a unit that is still alive.
    pub fn living(&self, id: UnitId) -> Option<&Unit> {
        self.get(id).filter(|unit| unit.is_alive())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    pub fn living_on(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(move |unit| unit.team == team && unit.is_alive())
    }

    pub fn any_living(&self, team: Team) -> bool {
        self.living_on(team).next().is_some()
    }

    /// Nearest living unit of `team` to `from`. Ties keep the earliest unit.
    pub fn nearest_living(&self, team: Team, from: Vec2) -> Option<UnitId> {
        let mut best: Option<(UnitId, f32)> = None;
        for unit in self.living_on(team) {
            let distance = unit.position.distance(from);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((unit.id, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Drop inert units of a team from storage. Returns how many were removed.
    pub fn remove_dead(&mut self, team: Team) -> usize {
        let before = self.units.len();
        self.units
            .retain(|unit| unit.team != team || unit.is_alive());
        before - self.units.len()
    }

    pub(crate) fn unit_at(&self, index: usize) -> &Unit {
        &self.units[index]
    }

    pub(crate) fn unit_at_mut(&mut self, index: usize) -> &mut Unit {
        &mut self.units[index]
    }
}

/// Shared state a unit update reads and writes besides the unit table.
pub struct UpdateContext<'a> {
    /// Effective (speed-scaled) delta time in seconds
    pub dt: f32,
    pub modifiers: &'a RogueliteModifierSet,
    pub player_castle: &'a mut Castle,
    pub rng: &'a mut GameRng,
    pub events: &'a mut Vec<BattleEvent>,
}

/// Advance the unit at `index` by one tick. Returns the integer damage it dealt.
pub fn update_unit(units: &mut UnitTable, index: usize, ctx: &mut UpdateContext) -> u32 {
    let (team, position) = {
        let unit = units.unit_at_mut(index);
        if !unit.is_alive() {
            return 0;
        }

        unit.skill_state.decay(ctx.dt);

        let expiry = unit.status.decay(ctx.dt);
        if expiry.stun_expired {
            unit.target_position = None;
        }
        if unit.status.stunned {
            return 0;
        }

        if let Some(target) = unit.target_position {
            let travel = unit.move_speed
                * ctx.modifiers.speed_scale_for(unit.team)
                * unit.status.slow_factor
                * (ctx.dt / TICK_SECS);
            let delta = target - unit.position;
            let distance = delta.length();
            if distance > travel {
                unit.position += delta / distance * travel;
            } else {
                unit.position = target;
                unit.target_position = None;
            }
        }

        unit.position = clamp_to_arena(unit.position);
        (unit.team, unit.position)
    };

    let current = units.unit_at(index).target_enemy;
    let target_id = match current.filter(|id| units.living(*id).is_some()) {
        Some(id) => Some(id),
        None => units.nearest_living(team.opponent(), position),
    };
    units.unit_at_mut(index).target_enemy = target_id;

    regenerate(units.unit_at_mut(index), ctx);

    let Some(target_id) = target_id else {
        return 0;
    };
    let Some(target_index) = units.index_of(target_id) else {
        return 0;
    };
    let distance = units.unit_at(target_index).distance_to(position);
    let (skill_ready, skill_range, attack_range) = {
        let caster = units.unit_at(index);
        (caster.skill_state.ready, caster.skill.range, caster.attack_range())
    };

    if skill_ready && distance < skill_range {
        let dealt = activate_skill(units, index, target_index, ctx);
        return dealt.floor() as u32;
    }

    if distance < attack_range {
        return normal_attack(units, index, target_index, ctx).floor() as u32;
    }

    0
}

fn regenerate(unit: &mut Unit, ctx: &mut UpdateContext) {
    let rate = unit.specialization.hp_regen_rate;
    if rate <= 0.0 || unit.hp >= unit.max_hp {
        return;
    }
    let healed = unit.heal(unit.max_hp * rate * ctx.dt);
    if healed > 0.0 {
        ctx.events.push(BattleEvent::Healing(HealingEvent {
            target: HitTarget::Unit(unit.id),
            target_name: unit.name.clone(),
            amount: healed,
            cause: "Regeneration".to_string(),
        }));
    }
}

/// Apply `amount` to a unit and report the hit (and the death, if any).
fn strike_unit(
    units: &mut UnitTable,
    attacker_index: usize,
    target_index: usize,
    amount: f32,
    ability_name: Option<&str>,
    is_critical: bool,
    events: &mut Vec<BattleEvent>,
) -> f32 {
    let (source, source_name) = {
        let attacker = units.unit_at(attacker_index);
        (attacker.id, attacker.name.clone())
    };

    let target = units.unit_at_mut(target_index);
    let (applied, died) = target.take_damage(amount);
    let target_id = target.id;
    let target_name = target.name.clone();

    units.unit_at_mut(attacker_index).damage_dealt += applied;

    events.push(BattleEvent::Damage(DamageEvent {
        source: Some(source),
        source_name: source_name.clone(),
        target: HitTarget::Unit(target_id),
        target_name: target_name.clone(),
        amount: applied,
        ability_name: ability_name.map(str::to_string),
        is_critical,
    }));
    if died {
        events.push(BattleEvent::UnitDied(UnitDeathEvent {
            victim: target_id,
            victim_name: target_name,
            killer_name: source_name,
        }));
    }
    applied
}

fn normal_attack(
    units: &mut UnitTable,
    attacker_index: usize,
    target_index: usize,
    ctx: &mut UpdateContext,
) -> f32 {
    let input = {
        let attacker = units.unit_at(attacker_index);
        let defender = units.unit_at(target_index);
        StrikeInput {
            attack: attacker.attack * ctx.modifiers.attack_scale_for(attacker.team),
            attacker_category: attacker.category,
            attacker_team: attacker.team,
            crit_rate: attacker.specialization.crit_rate,
            defender_category: defender.category,
            defender_team: defender.team,
        }
    };
    let outcome = resolve_strike(&input, ctx.modifiers, ctx.rng);

    let applied = strike_unit(
        units,
        attacker_index,
        target_index,
        outcome.damage,
        None,
        outcome.is_critical(),
        ctx.events,
    );

    if outcome.lifesteal > 0.0 {
        let healed = ctx.player_castle.heal(outcome.lifesteal);
        if healed > 0.0 {
            ctx.events.push(BattleEvent::Healing(HealingEvent {
                target: HitTarget::Castle(Team::Player),
                target_name: "Player Castle".to_string(),
                amount: healed,
                cause: "Lifesteal".to_string(),
            }));
        }
    }

    applied
}

fn apply_status(unit: &mut Unit, kind: StatusKind, duration: f32, events: &mut Vec<BattleEvent>) {
    if !unit.is_alive() {
        return;
    }
    match kind {
        StatusKind::Stun => unit.status.apply_stun(duration),
        StatusKind::Slow { factor } => unit.status.apply_slow(factor, duration),
    }
    debug!("{} afflicted with {:?} for {:.1}s", unit.name, kind, duration);
    events.push(BattleEvent::StatusApplied(StatusAppliedEvent {
        target: unit.id,
        target_name: unit.name.clone(),
        kind,
        duration,
    }));
}

/// Fire the caster's skill at the primary target. Returns total damage dealt.
///
/// Skill damage uses the team attack scalar but never crits, lifesteals, or
/// passes through damage reduction.
pub fn activate_skill(
    units: &mut UnitTable,
    caster_index: usize,
    target_index: usize,
    ctx: &mut UpdateContext,
) -> f32 {
    let (skill, caster_id, caster_name, caster_team, base) = {
        let caster = units.unit_at(caster_index);
        let target = units.unit_at(target_index);
        let attack = caster.attack * ctx.modifiers.attack_scale_for(caster.team);
        let advantage = type_advantage(caster.category, target.category);
        (
            caster.skill.clone(),
            caster.id,
            caster.name.clone(),
            caster.team,
            skill_damage(attack, caster.skill.damage_multiplier, advantage),
        )
    };

    ctx.events.push(BattleEvent::SkillUsed(SkillUsedEvent {
        caster: caster_id,
        caster_name: caster_name.clone(),
        target: units.unit_at(target_index).id,
        target_name: units.unit_at(target_index).name.clone(),
        skill_name: skill.name.clone(),
    }));
    debug!("{} activates {}", caster_name, skill.name);

    let mut total = 0.0;
    match skill.effect {
        SkillEffect::Pierce {
            stun_chance,
            stun_duration,
        } => {
            total += strike_unit(
                units,
                caster_index,
                target_index,
                base,
                Some(&skill.name),
                false,
                ctx.events,
            );
            if ctx.rng.roll(stun_chance) {
                apply_status(
                    units.unit_at_mut(target_index),
                    StatusKind::Stun,
                    stun_duration,
                    ctx.events,
                );
            }
        }
        SkillEffect::Charge {
            slow_factor,
            slow_duration,
            self_heal_fraction,
        } => {
            total += strike_unit(
                units,
                caster_index,
                target_index,
                base,
                Some(&skill.name),
                false,
                ctx.events,
            );
            apply_status(
                units.unit_at_mut(target_index),
                StatusKind::Slow {
                    factor: slow_factor,
                },
                slow_duration,
                ctx.events,
            );
            let caster = units.unit_at_mut(caster_index);
            let healed = caster.heal(caster.max_hp * self_heal_fraction);
            if healed > 0.0 {
                ctx.events.push(BattleEvent::Healing(HealingEvent {
                    target: HitTarget::Unit(caster_id),
                    target_name: caster_name.clone(),
                    amount: healed,
                    cause: skill.name.clone(),
                }));
            }
        }
        SkillEffect::Volley {
            arrow_count,
            splash_range,
            damage_factor,
            slow_factor,
            slow_duration,
        } => {
            let center = units.unit_at(target_index).position;
            let hit: Vec<usize> = (0..units.len())
                .filter(|&i| {
                    let unit = units.unit_at(i);
                    unit.team == caster_team.opponent()
                        && unit.is_alive()
                        && unit.position.distance(center) < splash_range
                })
                .take(arrow_count)
                .collect();
            for index in hit {
                total += strike_unit(
                    units,
                    caster_index,
                    index,
                    base * damage_factor,
                    Some(&skill.name),
                    false,
                    ctx.events,
                );
                apply_status(
                    units.unit_at_mut(index),
                    StatusKind::Slow {
                        factor: slow_factor,
                    },
                    slow_duration,
                    ctx.events,
                );
            }
        }
    }

    let cooldown = skill.cooldown * ctx.modifiers.cooldown_scale_for(caster_team);
    units.unit_at_mut(caster_index).skill_state.start(cooldown);
    total
}
