//! Wave director
//!
//! Drives the `Spawning -> Active -> Preparing -> Spawning` cycle. The first
//! wave spawns immediately; every later wave is preceded by a preparation
//! countdown during which one event choice is taken, either by the player or
//! automatically (the first offered choice) when the countdown runs out.

use bevy::prelude::*;
use serde::Serialize;
use std::collections::VecDeque;

use crate::combat::events::BattleEvent;

use super::components::{Category, GameRng, Team};
use super::constants::{
    ENEMY_ATTACK_FACTOR, ENEMY_ATTACK_PER_WAVE, ENEMY_HP_FACTORS, ENEMY_HP_PER_WAVE,
    ENEMY_SPAWN_Y, PREP_COUNTDOWN_SECS, SPAWN_COLUMNS,
};
use super::skill_config::SkillCatalog;
use super::stage_config::StageConfig;
use super::unit::{CombatantSpec, UnitTable};
use super::wave_events::{draw_event_choices, NextWaveModifiers, WaveEvent};

/// Movement speed of spawned enemies before next-wave modifiers.
const ENEMY_BASE_SPEED: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum WavePhase {
    /// The next wave spawns on the director's next update
    Spawning,
    /// Enemies of the current wave are alive
    Active,
    /// Between waves; `countdown` seconds left to choose an event
    Preparing { countdown: f32 },
    /// The final wave has been cleared
    Completed,
}

/// A choice taken during preparation, to be applied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TakenChoice {
    pub event: WaveEvent,
    pub auto_selected: bool,
}

#[derive(Debug, Clone)]
pub struct WaveDirector {
    wave_number: u32,
    max_waves: u32,
    phase: WavePhase,
    choices: Vec<WaveEvent>,
    next_wave: NextWaveModifiers,
    /// Choice indices to take automatically, one per preparation phase
    scripted: VecDeque<usize>,
}

impl WaveDirector {
    pub fn new(max_waves: u32) -> Self {
        Self {
            wave_number: 0,
            max_waves,
            phase: WavePhase::Spawning,
            choices: Vec::new(),
            next_wave: NextWaveModifiers::default(),
            scripted: VecDeque::new(),
        }
    }

    pub fn wave_number(&self) -> u32 {
        self.wave_number
    }

    pub fn max_waves(&self) -> u32 {
        self.max_waves
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    pub fn is_preparing(&self) -> bool {
        matches!(self.phase, WavePhase::Preparing { .. })
    }

    pub fn all_waves_spawned(&self) -> bool {
        self.wave_number >= self.max_waves
    }

    /// Choices on offer during preparation; empty otherwise.
    pub fn pending_choices(&self) -> &[WaveEvent] {
        &self.choices
    }

    pub fn next_wave_modifiers(&self) -> &NextWaveModifiers {
        &self.next_wave
    }

    pub fn next_wave_modifiers_mut(&mut self) -> &mut NextWaveModifiers {
        &mut self.next_wave
    }

    /// Queue choice indices that preparation phases take in order.
    pub fn queue_choices(&mut self, choices: impl IntoIterator<Item = usize>) {
        self.scripted.extend(choices);
    }

    /// Take a choice explicitly. Only legal while preparing.
    pub fn choose(&mut self, index: usize) -> Result<WaveEvent, String> {
        if !self.is_preparing() {
            return Err("No event choice is pending".to_string());
        }
        let event = *self.choices.get(index).ok_or_else(|| {
            format!(
                "Choice {} out of range ({} offered)",
                index,
                self.choices.len()
            )
        })?;
        self.finish_preparation();
        Ok(event)
    }

    fn finish_preparation(&mut self) {
        self.choices.clear();
        self.phase = WavePhase::Spawning;
    }

    /// Advance the director by one tick. Returns a choice the caller must
    /// apply when preparation ends through a script or the countdown.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        dt: f32,
        units: &mut UnitTable,
        stage: &StageConfig,
        catalog: &SkillCatalog,
        rng: &mut GameRng,
        gold: u32,
        events: &mut Vec<BattleEvent>,
    ) -> Option<TakenChoice> {
        match self.phase {
            WavePhase::Spawning => {
                let enemy_count = self.spawn_next_wave(units, stage, catalog);
                events.push(BattleEvent::WaveSpawned {
                    wave: self.wave_number,
                    enemy_count,
                });
                None
            }
            WavePhase::Active => {
                if units.any_living(Team::Enemy) {
                    return None;
                }
                if self.all_waves_spawned() {
                    info!("Final wave {} cleared", self.wave_number);
                    self.phase = WavePhase::Completed;
                    return None;
                }
                self.choices = draw_event_choices(rng, gold);
                self.phase = WavePhase::Preparing {
                    countdown: PREP_COUNTDOWN_SECS,
                };
                info!(
                    "Wave {} cleared, preparing wave {}",
                    self.wave_number,
                    self.wave_number + 1
                );
                events.push(BattleEvent::PreparationStarted {
                    next_wave: self.wave_number + 1,
                    choices: self.choices.iter().map(|c| c.name().to_string()).collect(),
                });
                None
            }
            WavePhase::Preparing { countdown } => {
                if let Some(index) = self.scripted.pop_front() {
                    let index = index.min(self.choices.len().saturating_sub(1));
                    if let Ok(event) = self.choose(index) {
                        return Some(TakenChoice {
                            event,
                            auto_selected: false,
                        });
                    }
                }
                let remaining = countdown - dt;
                if remaining > 0.0 {
                    self.phase = WavePhase::Preparing {
                        countdown: remaining,
                    };
                    return None;
                }
                let event = self.choices.first().copied();
                self.finish_preparation();
                event.map(|event| TakenChoice {
                    event,
                    auto_selected: true,
                })
            }
            WavePhase::Completed => None,
        }
    }

    /// Enemy specs for a wave, before next-wave modifiers.
    pub fn enemy_specs(stage: &StageConfig, wave: u32) -> Vec<CombatantSpec> {
        let step = wave.saturating_sub(1) as f32;
        let base_hp = stage.base_hp + step * ENEMY_HP_PER_WAVE;
        let base_attack = stage.base_attack + step * ENEMY_ATTACK_PER_WAVE;
        Category::all()
            .iter()
            .zip(ENEMY_HP_FACTORS)
            .map(|(category, hp_factor)| {
                CombatantSpec::new(
                    format!("Enemy {} (wave {})", category.name(), wave),
                    *category,
                    (base_hp * hp_factor).floor().max(1.0),
                    (base_attack * ENEMY_ATTACK_FACTOR).floor().max(1.0),
                    ENEMY_BASE_SPEED,
                )
            })
            .collect()
    }

    /// Remove the previous wave's remains and spawn the next one. Returns the
    /// number of enemies spawned.
    fn spawn_next_wave(
        &mut self,
        units: &mut UnitTable,
        stage: &StageConfig,
        catalog: &SkillCatalog,
    ) -> usize {
        units.remove_dead(Team::Enemy);
        self.wave_number += 1;

        let modifiers = std::mem::take(&mut self.next_wave);
        let mut specs = Self::enemy_specs(stage, self.wave_number);
        let count = specs.len().saturating_sub(modifiers.fewer_enemies).max(1);
        specs.truncate(count);

        for (spec, x) in specs.iter_mut().zip(SPAWN_COLUMNS) {
            spec.attack *= modifiers.enemy_attack_scale;
            spec.speed *= modifiers.enemy_speed_scale;
            units.spawn(spec, Team::Enemy, Vec2::new(x, ENEMY_SPAWN_Y), catalog);
        }

        self.phase = WavePhase::Active;
        info!(
            "Wave {}/{} spawned with {} enemies",
            self.wave_number, self.max_waves, count
        );
        count
    }
}
