//! User settings
//!
//! Defaults for battles started from the command line: speed, auto battle,
//! stage and where battle logs are written.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// User-configurable battle defaults
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleSettings {
    /// Speed multiplier used when no config sets one (1, 2 or 3)
    pub speed: u8,
    pub auto_battle: bool,
    pub stage: u32,
    /// Directory battle logs are written to when no output path is given
    pub log_directory: String,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            speed: 1,
            auto_battle: true,
            stage: 1,
            log_directory: "battle_logs".to_string(),
        }
    }
}

impl BattleSettings {
    /// Get the path to the settings file
    fn settings_path() -> PathBuf {
        PathBuf::from("settings.ron")
    }

    /// Load settings from `settings.ron`, or return default if it doesn't exist
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match ron::from_str(&contents) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to `settings.ron`
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, contents)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Settings with any command-line overrides applied.
    pub fn with_overrides(&self, stage: Option<u32>, speed: Option<u8>, auto_battle: Option<bool>) -> Self {
        Self {
            stage: stage.unwrap_or(self.stage),
            speed: speed.unwrap_or(self.speed),
            auto_battle: auto_battle.unwrap_or(self.auto_battle),
            ..self.clone()
        }
    }

    /// Default log file path for a battle
    pub fn log_path_for(&self, stage: u32, seed: Option<u64>) -> String {
        match seed {
            Some(seed) => format!("{}/stage{}_seed{}.json", self.log_directory, stage, seed),
            None => format!("{}/stage{}.json", self.log_directory, stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = BattleSettings::load_from(Path::new("does/not/exist.ron"));
        assert_eq!(settings, BattleSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: BattleSettings = ron::from_str("(speed: 3)").unwrap();
        assert_eq!(settings.speed, 3);
        assert!(settings.auto_battle);
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = std::env::temp_dir().join("siegesim_settings_test.ron");
        let settings = BattleSettings {
            speed: 2,
            auto_battle: false,
            stage: 3,
            log_directory: "logs".to_string(),
        };
        settings.save_to(&path).unwrap();
        assert_eq!(BattleSettings::load_from(&path), settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let settings = BattleSettings::default().with_overrides(Some(4), None, Some(false));
        assert_eq!(settings.stage, 4);
        assert_eq!(settings.speed, 1);
        assert!(!settings.auto_battle);
        assert_eq!(settings.log_directory, "battle_logs");
    }

    #[test]
    fn test_log_path_includes_seed() {
        let settings = BattleSettings::default();
        assert_eq!(settings.log_path_for(2, Some(7)), "battle_logs/stage2_seed7.json");
    }
}
