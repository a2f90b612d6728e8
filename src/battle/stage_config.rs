//! Stage, boss and friend-assist catalog
//!
//! Loaded from `assets/config/stages.ron`, embedded at compile time.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::castle::BossPhase;
use super::unit::CombatantSpec;

const EMBEDDED_STAGES: &str = include_str!("../../assets/config/stages.ron");

/// One stage (chapter) of the campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub chapter: u32,
    pub name: String,
    /// Number of enemy waves
    pub waves: u32,
    /// Enemy base hp for wave 1
    pub base_hp: f32,
    /// Enemy base attack for wave 1
    pub base_attack: f32,
    /// Whether the enemy castle is a boss fortress
    #[serde(default)]
    pub has_boss: bool,
}

impl StageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.waves == 0 {
            return Err(format!("Stage {} must have at least one wave", self.chapter));
        }
        if self.base_hp <= 0.0 || self.base_attack <= 0.0 {
            return Err(format!(
                "Stage {} must have positive base hp and attack",
                self.chapter
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BossAbilityEffect {
    /// One random living player unit
    Single,
    /// Every living player unit
    Aoe,
    /// Living player units under `threshold` of max hp take double damage
    Execute { threshold: f32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossAbilityConfig {
    pub phase: BossPhase,
    pub name: String,
    /// Multiplier on the boss's base attack
    pub damage_factor: f32,
    /// Seconds until the next ability after this one fires
    pub cooldown: f32,
    pub effect: BossAbilityEffect,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossConfig {
    pub name: String,
    pub base_attack: f32,
    pub abilities: Vec<BossAbilityConfig>,
}

impl BossConfig {
    /// The ability bound to a phase.
    pub fn ability_for(&self, phase: BossPhase) -> Option<&BossAbilityConfig> {
        self.abilities.iter().find(|ability| ability.phase == phase)
    }

    pub fn validate(&self) -> Result<(), String> {
        for phase in [BossPhase::One, BossPhase::Two, BossPhase::Three] {
            if self.ability_for(phase).is_none() {
                return Err(format!(
                    "Boss '{}' has no ability for phase {}",
                    self.name,
                    phase.number()
                ));
            }
        }
        Ok(())
    }
}

/// Root structure for the stages.ron file
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
pub struct StageCatalog {
    pub stages: Vec<StageConfig>,
    pub boss: BossConfig,
    #[serde(default)]
    pub friend_assists: Vec<CombatantSpec>,
}

impl Default for StageCatalog {
    /// Parse the catalog embedded at compile time.
    fn default() -> Self {
        Self::from_ron_str(EMBEDDED_STAGES).expect("Embedded stages.ron must be a valid stage catalog")
    }
}

impl StageCatalog {
    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let catalog: StageCatalog =
            ron::from_str(contents).map_err(|e| format!("Failed to parse stage catalog: {}", e))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let catalog = Self::from_ron_str(&contents)?;
        info!(
            "Loaded {} stages and {} friend assists from {}",
            catalog.stages.len(),
            catalog.friend_assists.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.stages.is_empty() {
            return Err("Stage catalog has no stages".to_string());
        }
        for stage in &self.stages {
            stage.validate()?;
        }
        for assist in &self.friend_assists {
            assist.validate()?;
        }
        self.boss.validate()
    }

    pub fn stage(&self, chapter: u32) -> Result<&StageConfig, String> {
        self.stages
            .iter()
            .find(|stage| stage.chapter == chapter)
            .ok_or_else(|| {
                format!(
                    "Unknown stage {}. Available: {:?}",
                    chapter,
                    self.stages.iter().map(|s| s.chapter).collect::<Vec<_>>()
                )
            })
    }

    pub fn friend_assist(&self, name: &str) -> Result<&CombatantSpec, String> {
        self.friend_assists
            .iter()
            .find(|assist| assist.name == name)
            .ok_or_else(|| format!("Unknown friend assist '{}'", name))
    }
}
