//! SiegeSim - Wave-based castle siege battle simulator
//!
//! Runs one battle headless and writes its combat log.

use siegesim::cli::{parse_args, Args};
use siegesim::headless::{run_headless_battle, HeadlessBattleConfig};
use siegesim::settings::BattleSettings;

/// Merge the config file (or default roster), user settings and CLI flags.
fn resolve_config(args: &Args, settings: &BattleSettings) -> Result<HeadlessBattleConfig, String> {
    let mut config = match &args.config {
        Some(path) => HeadlessBattleConfig::load_from_file(path)?,
        None => {
            let mut config = HeadlessBattleConfig::default_for_stage(settings.stage);
            config.speed = settings.speed;
            config.auto_battle = settings.auto_battle;
            config
        }
    };

    if let Some(stage) = args.stage {
        config.stage = stage;
    }
    if let Some(seed) = args.seed {
        config.random_seed = Some(seed);
    }
    if let Some(speed) = args.speed {
        config.speed = speed;
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }
    if args.no_auto {
        config.auto_battle = false;
    }
    if let Some(output) = &args.output {
        config.output_path = Some(output.to_string_lossy().into_owned());
    }
    if config.output_path.is_none() {
        config.output_path = Some(settings.log_path_for(config.stage, config.random_seed));
    }

    config.validate()?;
    Ok(config)
}

fn main() {
    let args = parse_args();
    let settings = BattleSettings::load();

    if args.save_settings {
        let auto_battle = args.no_auto.then_some(false);
        let updated = settings.with_overrides(args.stage, args.speed, auto_battle);
        if let Err(e) = updated.save() {
            eprintln!("Failed to save settings: {}", e);
        }
    }

    let config = match resolve_config(&args, &settings) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid battle configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_headless_battle(config) {
        eprintln!("Battle failed: {}", e);
        std::process::exit(1);
    }
}
