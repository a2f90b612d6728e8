//! Combat resolution
//!
//! Pure damage math shared by normal attacks and skills:
//! - Type advantage (spear > cavalry > bow > spear)
//! - Critical strikes (unit specialization and team-wide roguelite crit)
//! - Lifesteal into the player castle
//! - Team-wide damage reduction on the player side

use super::components::{Category, GameRng, Team};
use super::constants::CRIT_DAMAGE_MULTIPLIER;
use super::modifiers::RogueliteModifierSet;

/// Type advantage multiplier for an attack.
pub fn type_advantage(attacker: Category, defender: Category) -> f32 {
    attacker.advantage_against(defender)
}

/// Roll a critical strike check. Returns true if the roll is a crit.
pub fn roll_crit(crit_chance: f32, rng: &mut GameRng) -> bool {
    rng.roll(crit_chance)
}

/// Scale incoming damage by `(1 - reduction)`. Reduction may be negative,
/// in which case damage is amplified. Never returns negative damage.
pub fn apply_damage_reduction(damage: f32, reduction: f32) -> f32 {
    (damage * (1.0 - reduction)).max(0.0)
}

/// Skill damage before effect-specific factors.
pub fn skill_damage(attack: f32, damage_multiplier: f32, advantage: f32) -> f32 {
    attack * damage_multiplier * advantage
}

/// Everything needed to resolve one normal attack.
#[derive(Debug, Clone, Copy)]
pub struct StrikeInput {
    /// Effective attack (roguelite attack scalar already applied)
    pub attack: f32,
    pub attacker_category: Category,
    pub attacker_team: Team,
    /// Unit-level crit rate from specialization
    pub crit_rate: f32,
    pub defender_category: Category,
    pub defender_team: Team,
}

/// Result of a resolved normal attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeOutcome {
    /// Damage to subtract from the defender
    pub damage: f32,
    pub advantage: f32,
    pub unit_crit: bool,
    pub team_crit: bool,
    /// Amount to heal the player castle by
    pub lifesteal: f32,
}

impl StrikeOutcome {
    pub fn is_critical(&self) -> bool {
        self.unit_crit || self.team_crit
    }
}

/// Resolve a normal attack.
///
/// Order: type advantage, unit crit, team crit (player attackers only),
/// lifesteal on the post-crit damage (player attackers only), then damage
/// reduction when the defender is on the player team.
pub fn resolve_strike(
    input: &StrikeInput,
    modifiers: &RogueliteModifierSet,
    rng: &mut GameRng,
) -> StrikeOutcome {
    let advantage = type_advantage(input.attacker_category, input.defender_category);
    let mut damage = input.attack * advantage;

    let unit_crit = roll_crit(input.crit_rate, rng);
    if unit_crit {
        damage *= CRIT_DAMAGE_MULTIPLIER;
    }

    let mut team_crit = false;
    let mut lifesteal = 0.0;
    if input.attacker_team == Team::Player {
        team_crit = roll_crit(modifiers.crit_chance(), rng);
        if team_crit {
            damage *= CRIT_DAMAGE_MULTIPLIER;
        }
        lifesteal = damage * modifiers.lifesteal_rate();
    }

    if input.defender_team == Team::Player {
        damage = apply_damage_reduction(damage, modifiers.damage_reduction());
    }

    StrikeOutcome {
        damage,
        advantage,
        unit_crit,
        team_crit,
        lifesteal,
    }
}
