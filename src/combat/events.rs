//! Battle events
//!
//! Everything observable that happens during a tick. The simulation collects
//! them for the renderer (`BattleSimulation::drain_events`) and records each
//! one in the combat log.

use serde::Serialize;

use crate::battle::components::{Team, UnitId};
use crate::battle::simulation::BattleOutcome;

use super::log::CombatLogEventType;

/// What received damage or healing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HitTarget {
    Unit(UnitId),
    Castle(Team),
}

/// Event fired when damage is dealt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageEvent {
    /// Unit dealing the damage (None for the boss)
    pub source: Option<UnitId>,
    pub source_name: String,
    pub target: HitTarget,
    pub target_name: String,
    /// Amount removed from the target's hp
    pub amount: f32,
    /// Name of the skill or boss ability (None for normal attacks)
    pub ability_name: Option<String>,
    /// Whether this was a critical hit
    pub is_critical: bool,
}

/// Event fired when hp is restored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealingEvent {
    pub target: HitTarget,
    pub target_name: String,
    /// Amount actually healed (no overhealing)
    pub amount: f32,
    /// What caused the heal (skill, lifesteal, regeneration, event, shop item)
    pub cause: String,
}

/// Event fired when a unit activates its skill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillUsedEvent {
    pub caster: UnitId,
    pub caster_name: String,
    pub target: UnitId,
    pub target_name: String,
    pub skill_name: String,
}

/// Kind of status applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum StatusKind {
    Stun,
    Slow { factor: f32 },
}

/// Event fired when a stun or slow lands
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusAppliedEvent {
    pub target: UnitId,
    pub target_name: String,
    pub kind: StatusKind,
    /// Duration in seconds
    pub duration: f32,
}

/// Event fired when a unit's hp reaches zero
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitDeathEvent {
    pub victim: UnitId,
    pub victim_name: String,
    /// Unit that dealt the killing blow (None for the boss)
    pub killer_name: String,
}

/// Everything the simulation reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BattleEvent {
    Damage(DamageEvent),
    Healing(HealingEvent),
    SkillUsed(SkillUsedEvent),
    StatusApplied(StatusAppliedEvent),
    UnitDied(UnitDeathEvent),
    BossPhaseChanged { from: u8, to: u8 },
    BossAbility { ability_name: String, targets_hit: usize },
    WaveSpawned { wave: u32, enemy_count: usize },
    PreparationStarted { next_wave: u32, choices: Vec<String> },
    EventApplied { name: String, auto_selected: bool },
    ShopPurchase { item: String, cost: u32 },
    ShopRefreshed { cost: u32 },
    BattleEnded { outcome: BattleOutcome },
}

impl BattleEvent {
    /// Combat log category of this event
    pub fn log_type(&self) -> CombatLogEventType {
        match self {
            BattleEvent::Damage(DamageEvent {
                target: HitTarget::Castle(_),
                ..
            }) => CombatLogEventType::Siege,
            BattleEvent::Damage(_) => CombatLogEventType::Damage,
            BattleEvent::Healing(_) => CombatLogEventType::Healing,
            BattleEvent::SkillUsed(_) => CombatLogEventType::SkillUsed,
            BattleEvent::StatusApplied(_) => CombatLogEventType::Status,
            BattleEvent::UnitDied(_) => CombatLogEventType::Death,
            BattleEvent::BossPhaseChanged { .. } | BattleEvent::BossAbility { .. } => {
                CombatLogEventType::Boss
            }
            BattleEvent::WaveSpawned { .. } | BattleEvent::PreparationStarted { .. } => {
                CombatLogEventType::Wave
            }
            BattleEvent::EventApplied { .. } => CombatLogEventType::WaveEvent,
            BattleEvent::ShopPurchase { .. } | BattleEvent::ShopRefreshed { .. } => {
                CombatLogEventType::Shop
            }
            BattleEvent::BattleEnded { .. } => CombatLogEventType::MatchEvent,
        }
    }

    /// Human-readable description for the combat log
    pub fn describe(&self) -> String {
        match self {
            BattleEvent::Damage(event) => {
                let ability = event.ability_name.as_deref().unwrap_or("Attack");
                let crit = if event.is_critical { " (Critical)" } else { "" };
                format!(
                    "{}'s {} hits {} for {:.0} damage{}",
                    event.source_name, ability, event.target_name, event.amount, crit
                )
            }
            BattleEvent::Healing(event) => format!(
                "{} heals {} for {:.0}",
                event.cause, event.target_name, event.amount
            ),
            BattleEvent::SkillUsed(event) => format!(
                "{} uses {} on {}",
                event.caster_name, event.skill_name, event.target_name
            ),
            BattleEvent::StatusApplied(event) => match event.kind {
                StatusKind::Stun => format!(
                    "{} is stunned for {:.1}s",
                    event.target_name, event.duration
                ),
                StatusKind::Slow { factor } => format!(
                    "{} is slowed to {:.0}% speed for {:.1}s",
                    event.target_name,
                    factor * 100.0,
                    event.duration
                ),
            },
            BattleEvent::UnitDied(event) => {
                format!("{} has been slain by {}", event.victim_name, event.killer_name)
            }
            BattleEvent::BossPhaseChanged { from, to } => {
                format!("Boss enters phase {} (was phase {})", to, from)
            }
            BattleEvent::BossAbility {
                ability_name,
                targets_hit,
            } => format!("Boss uses {} hitting {} unit(s)", ability_name, targets_hit),
            BattleEvent::WaveSpawned { wave, enemy_count } => {
                format!("Wave {} begins with {} enemies", wave, enemy_count)
            }
            BattleEvent::PreparationStarted { next_wave, choices } => format!(
                "Preparing for wave {}. Choices: {}",
                next_wave,
                choices.join(", ")
            ),
            BattleEvent::EventApplied {
                name,
                auto_selected,
            } => {
                if *auto_selected {
                    format!("Event applied automatically: {}", name)
                } else {
                    format!("Event chosen: {}", name)
                }
            }
            BattleEvent::ShopPurchase { item, cost } => {
                format!("Bought {} for {} gold", item, cost)
            }
            BattleEvent::ShopRefreshed { cost } => format!("Shop refreshed for {} gold", cost),
            BattleEvent::BattleEnded { outcome } => format!("Battle ended: {}", outcome.name()),
        }
    }
}
