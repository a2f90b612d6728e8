//! Siege battle simulation
//!
//! Two forces fight on a bounded arena: the player's roster (plus an optional
//! friend assist) against waves of spawned enemies, each side defending a
//! castle. The enemy castle of the final chapter is a boss fortress with a
//! three-phase ability cycle.
//!
//! ## Module Structure
//! - `constants`: Arena geometry, timing and balance numbers
//! - `components`: Teams, categories, unit handles, seeded RNG
//! - `status`: Stun and slow timers
//! - `skill_config`: Skill catalog and specializations (RON)
//! - `stage_config`: Stage, boss and friend-assist catalog (RON)
//! - `combat_core`: Type advantage, crits, lifesteal, damage reduction
//! - `modifiers`: Battle-wide roguelite modifier stacks
//! - `unit`: Units, the unit table, and the per-tick unit update
//! - `castle`: Castles and the boss phase machine
//! - `wave_events`: Between-wave event pools and their effects
//! - `waves`: Wave director state machine
//! - `shop`: Between-wave shop
//! - `simulation`: The `BattleSimulation` driver

pub mod castle;
pub mod combat_core;
pub mod components;
pub mod constants;
pub mod modifiers;
pub mod shop;
pub mod simulation;
pub mod skill_config;
pub mod stage_config;
pub mod status;
pub mod unit;
pub mod wave_events;
pub mod waves;

pub use castle::{BossPhase, Castle};
pub use components::{Category, GameRng, Team, UnitId};
pub use modifiers::{RogueliteBuff, RogueliteCurse, RogueliteModifierSet};
pub use simulation::{BattleOutcome, BattleSetup, BattleSimulation, BattleSnapshot, SpeedMultiplier};
pub use skill_config::SkillCatalog;
pub use stage_config::{StageCatalog, StageConfig};
pub use unit::{CombatantSpec, Unit, UnitTable};
