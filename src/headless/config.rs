//! JSON configuration parsing for headless mode
//!
//! Parses JSON battle configurations and converts them to a `BattleSetup`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::battle::components::Category;
use crate::battle::constants::MAX_ROSTER_SIZE;
use crate::battle::simulation::{BattleSetup, SpeedMultiplier};
use crate::battle::stage_config::StageCatalog;
use crate::battle::unit::CombatantSpec;

/// One roster slot as written in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    /// "Pierce"/"Spear", "Charge"/"Cavalry" or "Ranged"/"Bow"
    pub category: String,
    pub hp: f32,
    pub attack: f32,
    #[serde(default = "default_unit_speed")]
    pub speed: f32,
}

impl RosterEntry {
    pub fn to_spec(&self) -> Result<CombatantSpec, String> {
        let category = Category::parse(&self.category)?;
        let spec = CombatantSpec::new(self.name.clone(), category, self.hp, self.attack, self.speed);
        spec.validate()?;
        Ok(spec)
    }
}

/// Headless battle configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessBattleConfig {
    /// Player roster (1-3 entries)
    pub roster: Vec<RosterEntry>,
    /// Stage chapter number (default: 1)
    #[serde(default = "default_stage")]
    pub stage: u32,
    /// Name of a friend assist from the stage catalog
    #[serde(default)]
    pub friend_assist: Option<String>,
    /// Starting gold for trades and the shop
    #[serde(default)]
    pub gold: u32,
    /// Random seed for deterministic battle reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Simulation speed multiplier: 1, 2 or 3 (default: 1)
    #[serde(default = "default_speed")]
    pub speed: u8,
    /// Whether units advance on their own (default: true)
    #[serde(default = "default_auto_battle")]
    pub auto_battle: bool,
    /// Event choice indices taken in order, one per preparation phase
    #[serde(default)]
    pub event_choices: Vec<usize>,
    /// Maximum battle duration in seconds (default: 600)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Custom output path for the battle log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
}

fn default_stage() -> u32 {
    1
}

fn default_speed() -> u8 {
    1
}

fn default_auto_battle() -> bool {
    true
}

fn default_max_duration() -> f32 {
    600.0
}

fn default_unit_speed() -> f32 {
    3.0
}

impl HeadlessBattleConfig {
    /// A three-unit roster with one of each category.
    pub fn default_for_stage(stage: u32) -> Self {
        Self {
            roster: vec![
                RosterEntry {
                    name: "Guan Yu".to_string(),
                    category: "Pierce".to_string(),
                    hp: 160.0,
                    attack: 26.0,
                    speed: 3.0,
                },
                RosterEntry {
                    name: "Ma Chao".to_string(),
                    category: "Charge".to_string(),
                    hp: 140.0,
                    attack: 28.0,
                    speed: 3.4,
                },
                RosterEntry {
                    name: "Huang Zhong".to_string(),
                    category: "Ranged".to_string(),
                    hp: 110.0,
                    attack: 30.0,
                    speed: 3.0,
                },
            ],
            stage,
            friend_assist: None,
            gold: 0,
            random_seed: None,
            speed: default_speed(),
            auto_battle: true,
            event_choices: Vec::new(),
            max_duration_secs: default_max_duration(),
            output_path: None,
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let config: HeadlessBattleConfig =
            serde_json::from_str(contents).map_err(|e| format!("Failed to parse JSON: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.roster.is_empty() || self.roster.len() > MAX_ROSTER_SIZE {
            return Err(format!("roster must have 1-{} members", MAX_ROSTER_SIZE));
        }
        for entry in &self.roster {
            entry.to_spec()?;
        }

        SpeedMultiplier::from_factor(self.speed)?;

        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }

        Ok(())
    }

    /// Convert to a `BattleSetup`, resolving the stage and friend assist.
    pub fn to_battle_setup(&self, catalog: &StageCatalog) -> Result<BattleSetup, String> {
        self.validate()?;

        let roster = self
            .roster
            .iter()
            .map(RosterEntry::to_spec)
            .collect::<Result<Vec<_>, _>>()?;
        let stage = catalog.stage(self.stage)?.clone();
        let boss = stage.has_boss.then(|| catalog.boss.clone());
        let friend_assist = match &self.friend_assist {
            Some(name) => Some(catalog.friend_assist(name)?.clone()),
            None => None,
        };

        Ok(BattleSetup {
            roster,
            stage,
            boss,
            friend_assist,
            gold: self.gold,
            auto_battle: self.auto_battle,
            speed: SpeedMultiplier::from_factor(self.speed)?,
            scripted_choices: self.event_choices.clone(),
        })
    }
}
