//! SiegeSim - Wave-based castle siege battle simulator
//!
//! A tick-based simulation of a roster of units defending their castle
//! against waves of enemies, with roguelite modifiers between waves and a
//! multi-phase boss fortress.
//!
//! This library exposes the simulation for headless runs, testing and reuse.

pub mod battle;
pub mod cli;
pub mod combat;
pub mod headless;
pub mod settings;

// Re-export commonly used types
pub use battle::{BattleOutcome, BattleSetup, BattleSimulation, BattleSnapshot, SpeedMultiplier};
pub use combat::log::{CombatLog, CombatLogEventType};
pub use headless::{simulate_battle, BattleResult, HeadlessBattleConfig};
