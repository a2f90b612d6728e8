//! Headless battle execution
//!
//! Runs siege battles without any graphical output, suitable for automated testing.

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use std::time::Duration;

use crate::battle::components::{GameRng, Team};
use crate::battle::constants::TICK_SECS;
use crate::battle::simulation::{BattleOutcome, BattleSimulation};
use crate::battle::skill_config::SkillCatalog;
use crate::battle::stage_config::StageCatalog;
use crate::combat::log::{BattleMetadata, UnitMetadata};

use super::config::HeadlessBattleConfig;

/// Result of a completed headless battle
///
/// This struct provides programmatic access to battle results for testing and analysis.
#[derive(Debug, Clone)]
pub struct BattleResult {
    /// Terminal outcome, or None if the battle hit the time limit
    pub outcome: Option<BattleOutcome>,
    /// Simulated battle time in seconds
    pub elapsed: f32,
    /// Last wave spawned
    pub wave_reached: u32,
    pub max_waves: u32,
    pub player_castle_hp: f32,
    pub enemy_castle_hp: f32,
    /// Final phase of the boss fortress, if the stage had one
    pub boss_phase: Option<u8>,
    /// Player units still alive at the end
    pub surviving_units: Vec<String>,
    pub gold_remaining: u32,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

impl BattleResult {
    pub fn from_simulation(sim: &BattleSimulation) -> Self {
        let outcome = sim.outcome();
        Self {
            outcome: outcome.is_terminal().then_some(outcome),
            elapsed: sim.elapsed(),
            wave_reached: sim.director().wave_number(),
            max_waves: sim.director().max_waves(),
            player_castle_hp: sim.player_castle().hp,
            enemy_castle_hp: sim.enemy_castle().hp,
            boss_phase: sim.enemy_castle().boss_phase().map(|phase| phase.number()),
            surviving_units: sim
                .units()
                .living_on(Team::Player)
                .map(|unit| unit.name.clone())
                .collect(),
            gold_remaining: sim.gold(),
            random_seed: sim.rng_seed(),
        }
    }

    pub fn outcome_name(&self) -> &'static str {
        self.outcome.map_or("Timeout", |outcome| outcome.name())
    }
}

/// Build a simulation from a headless configuration using the embedded catalogs.
pub fn build_simulation(config: &HeadlessBattleConfig) -> Result<BattleSimulation, String> {
    let stages = StageCatalog::default();
    let setup = config.to_battle_setup(&stages)?;
    let rng = match config.random_seed {
        Some(seed) => {
            info!("Using deterministic RNG with seed: {}", seed);
            GameRng::from_seed(seed)
        }
        None => {
            info!("Using non-deterministic RNG (no seed provided)");
            GameRng::from_entropy()
        }
    };
    BattleSimulation::new(setup, SkillCatalog::default(), rng)
}

/// Run a battle to completion (or the time limit) without bevy scheduling.
pub fn simulate_battle(config: &HeadlessBattleConfig) -> Result<BattleResult, String> {
    let mut sim = build_simulation(config)?;
    while sim.is_running() && sim.elapsed() < config.max_duration_secs {
        sim.tick(TICK_SECS);
        sim.drain_events();
    }
    if sim.is_running() {
        info!("Battle timed out after {:.1}s", sim.elapsed());
        sim.stop();
    }
    if let Some(path) = config.output_path.as_deref() {
        sim.combat_log().save_to_file(&battle_metadata(&sim), Some(path))?;
    }
    Ok(BattleResult::from_simulation(&sim))
}

/// Summary written next to the combat log
pub fn battle_metadata(sim: &BattleSimulation) -> BattleMetadata {
    let result = BattleResult::from_simulation(sim);
    BattleMetadata {
        stage_name: sim.stage().name.clone(),
        chapter: sim.stage().chapter,
        outcome: result.outcome_name().to_string(),
        waves_reached: result.wave_reached,
        max_waves: result.max_waves,
        elapsed_secs: result.elapsed,
        player_castle_hp: result.player_castle_hp,
        enemy_castle_hp: result.enemy_castle_hp,
        random_seed: result.random_seed,
        units: sim
            .units()
            .iter()
            .map(|unit| UnitMetadata {
                name: unit.name.clone(),
                team: unit.team.name().to_string(),
                category: unit.category.name().to_string(),
                max_hp: unit.max_hp,
                final_hp: unit.hp,
                damage_dealt: unit.damage_dealt,
                damage_taken: unit.damage_taken,
                final_position: (unit.position.x, unit.position.y),
            })
            .collect(),
    }
}

/// Resource to track headless battle state
#[derive(Resource)]
pub struct HeadlessBattleState {
    /// Maximum battle duration before declaring a timeout
    pub max_duration: f32,
    /// Custom output path for the battle log
    pub output_path: Option<String>,
    /// Whether the battle has completed
    pub battle_complete: bool,
    /// Battle result (populated when the battle completes)
    pub result: Option<BattleResult>,
}

/// Plugin for headless battle execution. Expects a `BattleSimulation` resource.
pub struct HeadlessPlugin {
    pub max_duration: f32,
    pub output_path: Option<String>,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(HeadlessBattleState {
            max_duration: self.max_duration,
            output_path: self.output_path.clone(),
            battle_complete: false,
            result: None,
        })
        .add_systems(
            Update,
            (headless_tick_battle, headless_check_battle_end).chain(),
        )
        .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

/// Advance the battle one fixed tick per frame
fn headless_tick_battle(
    mut sim: ResMut<BattleSimulation>,
    headless_state: Res<HeadlessBattleState>,
) {
    if headless_state.battle_complete {
        return;
    }
    sim.tick(TICK_SECS);
    for event in sim.drain_events() {
        debug!("{}", event.describe());
    }
}

/// Check if the battle has ended (terminal outcome or timeout)
fn headless_check_battle_end(
    mut sim: ResMut<BattleSimulation>,
    mut headless_state: ResMut<HeadlessBattleState>,
) {
    if headless_state.battle_complete {
        return;
    }

    if sim.is_running() {
        if sim.elapsed() < headless_state.max_duration {
            return;
        }
        info!("Battle timed out after {:.1}s", sim.elapsed());
        sim.stop();
    }

    let result = BattleResult::from_simulation(&sim);
    info!(
        "Battle ended: {} at wave {}/{} (castles {:.0} / {:.0})",
        result.outcome_name(),
        result.wave_reached,
        result.max_waves,
        result.player_castle_hp,
        result.enemy_castle_hp
    );

    match sim
        .combat_log()
        .save_to_file(&battle_metadata(&sim), headless_state.output_path.as_deref())
    {
        Ok(filename) => {
            println!("Battle complete. Log saved to: {}", filename);
        }
        Err(e) => {
            error!("Failed to save combat log: {}", e);
        }
    }

    headless_state.result = Some(result);
    headless_state.battle_complete = true;
}

/// Exit the app when the battle is complete
fn headless_exit_on_complete(
    headless_state: Res<HeadlessBattleState>,
    mut exit: EventWriter<AppExit>,
) {
    if headless_state.battle_complete {
        exit.send(AppExit::Success);
    }
}

/// Run a headless battle with the given configuration
pub fn run_headless_battle(config: HeadlessBattleConfig) -> Result<(), String> {
    let simulation = build_simulation(&config)?;

    println!("Starting headless battle simulation...");
    println!(
        "  Roster: {:?}",
        config.roster.iter().map(|r| r.name.as_str()).collect::<Vec<_>>()
    );
    println!("  Stage: {}", config.stage);
    println!("  Speed: x{}", config.speed);
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    App::new()
        // Minimal plugins - no window, no rendering
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
        )
        .add_plugins(LogPlugin::default())
        .insert_resource(simulation)
        .add_plugins(HeadlessPlugin {
            max_duration: config.max_duration_secs,
            output_path: config.output_path.clone(),
        })
        .run();

    Ok(())
}
