//! Headless mode for automated battles
//!
//! Runs siege battles without any graphical output, suitable for balance
//! testing and scripted play.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless battle
//! cargo run --release -- --config battle_config.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "roster": [
//!     {"name": "Guan Yu", "category": "Pierce", "hp": 160, "attack": 26},
//!     {"name": "Huang Zhong", "category": "Ranged", "hp": 110, "attack": 30}
//!   ],
//!   "stage": 3,
//!   "gold": 200,
//!   "random_seed": 42,
//!   "event_choices": [0, 2, 1]
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::HeadlessBattleConfig;
pub use runner::{run_headless_battle, simulate_battle, BattleResult};
