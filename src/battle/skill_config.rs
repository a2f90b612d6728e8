//! Data-Driven Skill Configuration
//!
//! Skill definitions and named-combatant specializations are loaded from
//! `assets/config/skills.ron`. The file is embedded at compile time so a
//! battle can always start; a different catalog can be loaded from disk
//! for balance experiments.
//!
//! ## Usage
//! ```ignore
//! let catalog = SkillCatalog::default();
//! let skill = catalog.skill_for(Category::Pierce).clone();
//! println!("{} cooldown: {}", skill.name, skill.cooldown);
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::components::Category;

const EMBEDDED_SKILLS: &str = include_str!("../../assets/config/skills.ron");

/// Effect-specific parameters of a skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SkillEffect {
    /// Single target hit with a chance to stun.
    Pierce { stun_chance: f32, stun_duration: f32 },
    /// Single target hit that slows the target and heals the caster.
    Charge {
        slow_factor: f32,
        slow_duration: f32,
        self_heal_fraction: f32,
    },
    /// Several arrows around the primary target, each slowing what it hits.
    Volley {
        arrow_count: usize,
        splash_range: f32,
        damage_factor: f32,
        slow_factor: f32,
        slow_duration: f32,
    },
}

impl SkillEffect {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SkillEffect::Pierce { .. } => "pierce",
            SkillEffect::Charge { .. } => "charge",
            SkillEffect::Volley { .. } => "volley",
        }
    }
}

/// A category's skill. Units hold their own copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Display name of the skill
    pub name: String,
    /// Cooldown after activation in seconds
    pub cooldown: f32,
    /// Multiplier on the caster's attack
    pub damage_multiplier: f32,
    /// Maximum distance to the primary target
    pub range: f32,
    pub effect: SkillEffect,
}

/// Named-combatant passive bonus, as written in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Specialization {
    DamageBoost(f32),
    SpeedBoost(f32),
    CritRate(f32),
    SkillCooldown(f32),
    SkillDamage(f32),
    HpRecovery(f32),
}

/// Flat multipliers a specialization applies once at unit creation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SpecializationModifiers {
    pub damage: f32,
    pub speed: f32,
    pub crit_rate: f32,
    pub skill_cooldown_scale: f32,
    pub skill_damage_scale: f32,
    /// Fraction of max hp regenerated per second
    pub hp_regen_rate: f32,
}

impl Default for SpecializationModifiers {
    fn default() -> Self {
        Self {
            damage: 1.0,
            speed: 1.0,
            crit_rate: 0.0,
            skill_cooldown_scale: 1.0,
            skill_damage_scale: 1.0,
            hp_regen_rate: 0.0,
        }
    }
}

impl From<Specialization> for SpecializationModifiers {
    fn from(spec: Specialization) -> Self {
        let base = SpecializationModifiers::default();
        match spec {
            Specialization::DamageBoost(value) => Self { damage: value, ..base },
            Specialization::SpeedBoost(value) => Self { speed: value, ..base },
            Specialization::CritRate(value) => Self { crit_rate: value, ..base },
            Specialization::SkillCooldown(value) => Self {
                skill_cooldown_scale: value,
                ..base
            },
            Specialization::SkillDamage(value) => Self {
                skill_damage_scale: value,
                ..base
            },
            Specialization::HpRecovery(value) => Self {
                hp_regen_rate: value,
                ..base
            },
        }
    }
}

/// Root structure for the skills.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct SkillsConfig {
    pub skills: HashMap<Category, SkillDefinition>,
    #[serde(default)]
    pub specializations: HashMap<String, Specialization>,
}

/// Immutable skill templates keyed by category, plus the specialization table.
#[derive(Resource, Debug, Clone)]
pub struct SkillCatalog {
    skills: HashMap<Category, SkillDefinition>,
    specializations: HashMap<String, Specialization>,
}

impl Default for SkillCatalog {
    /// Parse the catalog embedded at compile time.
    /// Panics if the embedded file is malformed; tests keep it valid.
    fn default() -> Self {
        Self::from_ron_str(EMBEDDED_SKILLS)
            .expect("Embedded skills.ron must be a valid skill catalog")
    }
}

impl SkillCatalog {
    /// Create from a loaded config
    pub fn new(config: SkillsConfig) -> Self {
        Self {
            skills: config.skills,
            specializations: config.specializations,
        }
    }

    /// Parse and validate a catalog from RON text
    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let config: SkillsConfig =
            ron::from_str(contents).map_err(|e| format!("Failed to parse skill catalog: {}", e))?;
        let catalog = Self::new(config);
        catalog
            .validate()
            .map_err(|missing| format!("Missing skill definitions: {:?}", missing))?;
        Ok(catalog)
    }

    /// Load a catalog from a RON file on disk
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let catalog = Self::from_ron_str(&contents)?;
        info!(
            "Loaded {} skill definitions and {} specializations from {}",
            catalog.skills.len(),
            catalog.specializations.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Check every category has a skill
    pub fn validate(&self) -> Result<(), Vec<Category>> {
        let missing: Vec<Category> = Category::all()
            .iter()
            .copied()
            .filter(|category| !self.skills.contains_key(category))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// Get the skill template for a category.
    /// Every category is present once the catalog has been validated.
    pub fn skill_for(&self, category: Category) -> &SkillDefinition {
        self.skills
            .get(&category)
            .unwrap_or_else(|| panic!("Skill for {:?} not found in catalog", category))
    }

    /// Specialization of a named combatant, if it has one.
    pub fn specialization_for(&self, name: &str) -> Option<Specialization> {
        self.specializations.get(name).copied()
    }
}
