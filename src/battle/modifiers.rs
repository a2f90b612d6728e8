//! Battle-wide roguelite modifiers
//!
//! Crit chance, damage reduction, lifesteal and the player team's attack,
//! speed and cooldown scalars. Every contribution is kept as an additive
//! stack tagged with its source, so removing one (trading away a curse)
//! subtracts exactly what it added regardless of what was applied since.
//!
//! The set is owned by a single `BattleSimulation`; nothing here is global.

use serde::Serialize;
use smallvec::{smallvec, SmallVec};

use super::components::Team;
use super::shop::ShopItemKind;

/// Lowest value a scalar (attack, speed, cooldown) can be driven down to.
pub const MIN_SCALAR: f32 = 0.1;

/// A stat the modifier set tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModifierStat {
    CritChance,
    DamageReduction,
    Lifesteal,
    AttackScale,
    SpeedScale,
    CooldownScale,
}

/// Roguelite buffs offered between waves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RogueliteBuff {
    AttackSpeed,
    Crit,
    MoveSpeed,
    Lifesteal,
    Armor,
    Cooldown,
}

impl RogueliteBuff {
    pub fn all() -> &'static [RogueliteBuff] {
        &[
            RogueliteBuff::AttackSpeed,
            RogueliteBuff::Crit,
            RogueliteBuff::MoveSpeed,
            RogueliteBuff::Lifesteal,
            RogueliteBuff::Armor,
            RogueliteBuff::Cooldown,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            RogueliteBuff::AttackSpeed => "Attack Speed +30%",
            RogueliteBuff::Crit => "Crit +25%",
            RogueliteBuff::MoveSpeed => "Move Speed +40%",
            RogueliteBuff::Lifesteal => "Lifesteal +15%",
            RogueliteBuff::Armor => "Armor +25%",
            RogueliteBuff::Cooldown => "Skill Cooldown -40%",
        }
    }

    fn effects(&self) -> SmallVec<[(ModifierStat, f32); 2]> {
        match self {
            RogueliteBuff::AttackSpeed => smallvec![(ModifierStat::AttackScale, 0.3)],
            RogueliteBuff::Crit => smallvec![(ModifierStat::CritChance, 0.25)],
            RogueliteBuff::MoveSpeed => smallvec![(ModifierStat::SpeedScale, 0.4)],
            RogueliteBuff::Lifesteal => smallvec![(ModifierStat::Lifesteal, 0.15)],
            RogueliteBuff::Armor => smallvec![(ModifierStat::DamageReduction, 0.25)],
            RogueliteBuff::Cooldown => smallvec![(ModifierStat::CooldownScale, -0.4)],
        }
    }
}

/// Roguelite curses offered between waves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RogueliteCurse {
    Weakness,
    Sluggish,
    Fragile,
}

impl RogueliteCurse {
    pub fn all() -> &'static [RogueliteCurse] {
        &[
            RogueliteCurse::Weakness,
            RogueliteCurse::Sluggish,
            RogueliteCurse::Fragile,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            RogueliteCurse::Weakness => "Curse: Weakness",
            RogueliteCurse::Sluggish => "Curse: Sluggish",
            RogueliteCurse::Fragile => "Curse: Fragile",
        }
    }

    fn effects(&self) -> SmallVec<[(ModifierStat, f32); 2]> {
        match self {
            RogueliteCurse::Weakness => smallvec![(ModifierStat::AttackScale, -0.3)],
            RogueliteCurse::Sluggish => smallvec![(ModifierStat::SpeedScale, -0.5)],
            // Negative reduction: damage taken is amplified
            RogueliteCurse::Fragile => smallvec![(ModifierStat::DamageReduction, -0.4)],
        }
    }
}

/// Where a stack came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModifierSource {
    Buff(RogueliteBuff),
    Curse(RogueliteCurse),
    Shop(ShopItemKind),
}

/// One applied contribution, with the exact deltas it added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifierStack {
    pub source: ModifierSource,
    pub effects: SmallVec<[(ModifierStat, f32); 2]>,
}

/// Battle-scoped modifier state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RogueliteModifierSet {
    stacks: Vec<ModifierStack>,
}

impl RogueliteModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all stacks for a stat.
    fn total(&self, stat: ModifierStat) -> f32 {
        self.stacks
            .iter()
            .flat_map(|stack| stack.effects.iter())
            .filter(|(s, _)| *s == stat)
            .map(|(_, value)| value)
            .sum()
    }

    pub fn crit_chance(&self) -> f32 {
        self.total(ModifierStat::CritChance).clamp(0.0, 1.0)
    }

    /// Damage reduction for the player team. May be negative.
    pub fn damage_reduction(&self) -> f32 {
        self.total(ModifierStat::DamageReduction)
    }

    pub fn lifesteal_rate(&self) -> f32 {
        self.total(ModifierStat::Lifesteal).max(0.0)
    }

    pub fn attack_scale(&self) -> f32 {
        (1.0 + self.total(ModifierStat::AttackScale)).max(MIN_SCALAR)
    }

    pub fn speed_scale(&self) -> f32 {
        (1.0 + self.total(ModifierStat::SpeedScale)).max(MIN_SCALAR)
    }

    pub fn cooldown_scale(&self) -> f32 {
        (1.0 + self.total(ModifierStat::CooldownScale)).max(MIN_SCALAR)
    }

    /// Attack scalar for a team. Only the player team carries modifiers.
    pub fn attack_scale_for(&self, team: Team) -> f32 {
        match team {
            Team::Player => self.attack_scale(),
            Team::Enemy => 1.0,
        }
    }

    pub fn speed_scale_for(&self, team: Team) -> f32 {
        match team {
            Team::Player => self.speed_scale(),
            Team::Enemy => 1.0,
        }
    }

    pub fn cooldown_scale_for(&self, team: Team) -> f32 {
        match team {
            Team::Player => self.cooldown_scale(),
            Team::Enemy => 1.0,
        }
    }

    pub fn apply_buff(&mut self, buff: RogueliteBuff) {
        self.stacks.push(ModifierStack {
            source: ModifierSource::Buff(buff),
            effects: buff.effects(),
        });
    }

    pub fn apply_curse(&mut self, curse: RogueliteCurse) {
        self.stacks.push(ModifierStack {
            source: ModifierSource::Curse(curse),
            effects: curse.effects(),
        });
    }

    /// Record a shop purchase's lasting effects.
    pub fn apply_shop(&mut self, item: ShopItemKind, effects: SmallVec<[(ModifierStat, f32); 2]>) {
        if effects.is_empty() {
            return;
        }
        self.stacks.push(ModifierStack {
            source: ModifierSource::Shop(item),
            effects,
        });
    }

    /// Remove the oldest active curse, undoing exactly what it added.
    pub fn remove_oldest_curse(&mut self) -> Option<RogueliteCurse> {
        let index = self
            .stacks
            .iter()
            .position(|stack| matches!(stack.source, ModifierSource::Curse(_)))?;
        match self.stacks.remove(index).source {
            ModifierSource::Curse(curse) => Some(curse),
            _ => None,
        }
    }

    /// Applied buffs, oldest first.
    pub fn active_buffs(&self) -> Vec<RogueliteBuff> {
        self.stacks
            .iter()
            .filter_map(|stack| match stack.source {
                ModifierSource::Buff(buff) => Some(buff),
                _ => None,
            })
            .collect()
    }

    /// Applied curses still in effect, oldest first.
    pub fn active_curses(&self) -> Vec<RogueliteCurse> {
        self.stacks
            .iter()
            .filter_map(|stack| match stack.source {
                ModifierSource::Curse(curse) => Some(curse),
                _ => None,
            })
            .collect()
    }

    pub fn stacks(&self) -> &[ModifierStack] {
        &self.stacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crit_buff_sets_exact_chance() {
        let mut mods = RogueliteModifierSet::new();
        mods.apply_buff(RogueliteBuff::Crit);
        assert_eq!(mods.crit_chance(), 0.25);
    }

    #[test]
    fn test_fragile_curse_makes_reduction_negative() {
        let mut mods = RogueliteModifierSet::new();
        mods.apply_curse(RogueliteCurse::Fragile);
        assert!((mods.damage_reduction() + 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_removing_curse_out_of_order_leaves_no_drift() {
        let mut mods = RogueliteModifierSet::new();
        mods.apply_curse(RogueliteCurse::Weakness);
        mods.apply_buff(RogueliteBuff::AttackSpeed);
        mods.apply_shop(ShopItemKind::AttackDraught, smallvec![(ModifierStat::AttackScale, 0.2)]);

        let removed = mods.remove_oldest_curse();
        assert_eq!(removed, Some(RogueliteCurse::Weakness));
        assert!((mods.attack_scale() - 1.5).abs() < 1e-6);
        assert!(mods.active_curses().is_empty());
        assert_eq!(mods.active_buffs(), vec![RogueliteBuff::AttackSpeed]);
    }

    #[test]
    fn test_remove_curse_with_none_active() {
        let mut mods = RogueliteModifierSet::new();
        mods.apply_buff(RogueliteBuff::Armor);
        assert_eq!(mods.remove_oldest_curse(), None);
        assert_eq!(mods.damage_reduction(), 0.25);
    }

    #[test]
    fn test_scalars_never_reach_zero() {
        let mut mods = RogueliteModifierSet::new();
        mods.apply_buff(RogueliteBuff::Cooldown);
        mods.apply_buff(RogueliteBuff::Cooldown);
        mods.apply_buff(RogueliteBuff::Cooldown);
        assert_eq!(mods.cooldown_scale(), MIN_SCALAR);
    }

    #[test]
    fn test_enemy_team_is_unmodified() {
        let mut mods = RogueliteModifierSet::new();
        mods.apply_curse(RogueliteCurse::Weakness);
        mods.apply_buff(RogueliteBuff::MoveSpeed);
        assert_eq!(mods.attack_scale_for(Team::Enemy), 1.0);
        assert_eq!(mods.speed_scale_for(Team::Enemy), 1.0);
        assert!((mods.speed_scale_for(Team::Player) - 1.4).abs() < 1e-6);
    }
}
