//! Command-line interface for SiegeSim
//!
//! Battles run headless; flags override the JSON config and `settings.ron`.

use clap::Parser;
use std::path::PathBuf;

/// Wave-based castle siege battle simulator
#[derive(Parser, Debug)]
#[command(name = "siegesim")]
#[command(about = "Wave-based castle siege battle simulator")]
#[command(version)]
pub struct Args {
    /// Battle configuration JSON file (a default roster is used when omitted)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Stage (chapter) to play
    #[arg(long)]
    pub stage: Option<u32>,

    /// Random seed for a reproducible battle
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulation speed multiplier (1, 2 or 3)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
    pub speed: Option<u8>,

    /// Output path for the battle log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum battle duration in seconds
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Disable auto battle (units hold position unless ordered)
    #[arg(long)]
    pub no_auto: bool,

    /// Store --stage, --speed and --no-auto in `settings.ron` as the new defaults
    #[arg(long)]
    pub save_settings: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let args = Args::try_parse_from([
            "siegesim", "--stage", "3", "--seed", "42", "--speed", "2", "--no-auto",
        ])
        .unwrap();
        assert_eq!(args.stage, Some(3));
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.speed, Some(2));
        assert!(args.no_auto);
        assert!(args.config.is_none());
        assert!(!args.save_settings);
    }

    #[test]
    fn test_speed_out_of_range_rejected() {
        assert!(Args::try_parse_from(["siegesim", "--speed", "5"]).is_err());
    }
}
