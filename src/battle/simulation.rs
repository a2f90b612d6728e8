//! Battle simulation driver
//!
//! `BattleSimulation` owns every piece of battle state and advances it one
//! atomic tick at a time:
//!
//! 1. wave director (spawn, clear detection, preparation countdown)
//! 2. auto-battle move orders
//! 3. unit updates, in storage order
//! 4. siege pass
//! 5. boss phase and ability
//! 6. outcome evaluation
//!
//! Nothing is read by observers mid-tick. Events produced during a tick are
//! recorded in the combat log and queued for `drain_events`.

use bevy::prelude::*;
use serde::Serialize;

use crate::combat::events::{BattleEvent, DamageEvent, HealingEvent, HitTarget};
use crate::combat::log::{CombatLog, CombatLogEventType};

use super::castle::{update_boss, Castle};
use super::components::{clamp_to_arena, Category, GameRng, Team, UnitId};
use super::constants::{
    AUTO_ADVANCE_OFFSET, ENEMY_CASTLE_POS, FRIEND_ASSIST_POS, MAX_ROSTER_SIZE, PLAYER_CASTLE_POS,
    PLAYER_SPAWN_Y, SHOP_REFRESH_COST, SPAWN_COLUMNS,
};
use super::modifiers::RogueliteModifierSet;
use super::shop::BattleShop;
use super::skill_config::SkillCatalog;
use super::stage_config::{BossConfig, StageConfig};
use super::unit::{update_unit, CombatantSpec, Unit, UnitTable, UpdateContext};
use super::wave_events::{apply_event, EventContext, WaveEvent};
use super::waves::{TakenChoice, WaveDirector, WavePhase};

/// Discrete outcome signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BattleOutcome {
    Ongoing,
    Defeat,
    Victory,
    StageComplete,
}

impl BattleOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            BattleOutcome::Ongoing => "Ongoing",
            BattleOutcome::Defeat => "Defeat",
            BattleOutcome::Victory => "Victory",
            BattleOutcome::StageComplete => "Stage Complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != BattleOutcome::Ongoing
    }
}

/// Player-selectable simulation speed. Scales each tick's dt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SpeedMultiplier {
    #[default]
    X1,
    X2,
    X3,
}

impl SpeedMultiplier {
    pub fn factor(&self) -> f32 {
        match self {
            SpeedMultiplier::X1 => 1.0,
            SpeedMultiplier::X2 => 2.0,
            SpeedMultiplier::X3 => 3.0,
        }
    }

    pub fn from_factor(factor: u8) -> Result<Self, String> {
        match factor {
            1 => Ok(SpeedMultiplier::X1),
            2 => Ok(SpeedMultiplier::X2),
            3 => Ok(SpeedMultiplier::X3),
            _ => Err(format!("Speed must be 1, 2 or 3 (got {})", factor)),
        }
    }
}

/// Everything needed to start a battle.
#[derive(Debug, Clone)]
pub struct BattleSetup {
    /// Ordered roster, at most three entries
    pub roster: Vec<CombatantSpec>,
    pub stage: StageConfig,
    /// Required when the stage has a boss
    pub boss: Option<BossConfig>,
    pub friend_assist: Option<CombatantSpec>,
    pub gold: u32,
    pub auto_battle: bool,
    pub speed: SpeedMultiplier,
    /// Event choice indices taken automatically, one per preparation phase
    pub scripted_choices: Vec<usize>,
}

impl BattleSetup {
    pub fn new(roster: Vec<CombatantSpec>, stage: StageConfig) -> Self {
        Self {
            roster,
            stage,
            boss: None,
            friend_assist: None,
            gold: 0,
            auto_battle: false,
            speed: SpeedMultiplier::X1,
            scripted_choices: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.roster.is_empty() {
            return Err("Roster must contain at least one combatant".to_string());
        }
        if self.roster.len() > MAX_ROSTER_SIZE {
            return Err(format!(
                "Roster has {} combatants, at most {} allowed",
                self.roster.len(),
                MAX_ROSTER_SIZE
            ));
        }
        for spec in self.roster.iter().chain(self.friend_assist.iter()) {
            spec.validate()?;
        }
        self.stage.validate()?;
        if self.stage.has_boss {
            match &self.boss {
                Some(boss) => boss.validate()?,
                None => {
                    return Err(format!(
                        "Stage {} has a boss but no boss configuration was given",
                        self.stage.chapter
                    ))
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Snapshot
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CastleView {
    pub hp: f32,
    pub max_hp: f32,
    pub position: (f32, f32),
}

impl From<&Castle> for CastleView {
    fn from(castle: &Castle) -> Self {
        Self {
            hp: castle.hp,
            max_hp: castle.max_hp,
            position: (castle.position.x, castle.position.y),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitView {
    pub id: UnitId,
    pub name: String,
    pub team: Team,
    pub category: Category,
    pub position: (f32, f32),
    pub hp: f32,
    pub max_hp: f32,
    pub stunned: bool,
    pub slowed: bool,
    pub skill_ready: bool,
    pub skill_cooldown_remaining: f32,
    pub target: Option<UnitId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreparationView {
    pub next_wave: u32,
    pub countdown: f32,
    pub choices: Vec<String>,
    pub shop: Vec<(String, u32, bool)>,
}

/// Read-only view of a battle between ticks, enough to render it.
#[derive(Debug, Clone, Serialize)]
pub struct BattleSnapshot {
    pub elapsed: f32,
    pub outcome: BattleOutcome,
    pub wave: u32,
    pub max_waves: u32,
    pub boss_phase: Option<u8>,
    pub player_castle: CastleView,
    pub enemy_castle: CastleView,
    /// Living units only
    pub units: Vec<UnitView>,
    pub preparation: Option<PreparationView>,
    pub gold: u32,
    pub auto_battle: bool,
    pub active_buffs: Vec<String>,
    pub active_curses: Vec<String>,
}

// ============================================================================
// Simulation
// ============================================================================

#[derive(Resource)]
pub struct BattleSimulation {
    units: UnitTable,
    player_castle: Castle,
    enemy_castle: Castle,
    modifiers: RogueliteModifierSet,
    director: WaveDirector,
    shop: BattleShop,
    rng: GameRng,
    catalog: SkillCatalog,
    stage: StageConfig,
    boss: Option<BossConfig>,
    gold: u32,
    auto_battle: bool,
    speed: SpeedMultiplier,
    running: bool,
    outcome: BattleOutcome,
    elapsed: f32,
    log: CombatLog,
    pending_events: Vec<BattleEvent>,
}

impl BattleSimulation {
    /// Validate the setup and place the roster, the friend assist and both castles.
    pub fn new(setup: BattleSetup, catalog: SkillCatalog, rng: GameRng) -> Result<Self, String> {
        setup.validate()?;

        let mut units = UnitTable::new();
        for (spec, x) in setup.roster.iter().zip(SPAWN_COLUMNS) {
            units.spawn(
                &spec.with_player_bonus(),
                Team::Player,
                Vec2::new(x, PLAYER_SPAWN_Y),
                &catalog,
            );
        }
        if let Some(assist) = &setup.friend_assist {
            units.spawn(assist, Team::Player, Vec2::from(FRIEND_ASSIST_POS), &catalog);
        }

        let player_castle = Castle::new(Team::Player, Vec2::from(PLAYER_CASTLE_POS));
        let enemy_castle = if setup.stage.has_boss {
            Castle::new_boss(Team::Enemy, Vec2::from(ENEMY_CASTLE_POS))
        } else {
            Castle::new(Team::Enemy, Vec2::from(ENEMY_CASTLE_POS))
        };

        let mut director = WaveDirector::new(setup.stage.waves);
        director.queue_choices(setup.scripted_choices.iter().copied());

        let mut log = CombatLog::default();
        log.log(
            CombatLogEventType::MatchEvent,
            format!(
                "Battle started: stage {} '{}' with {} units",
                setup.stage.chapter,
                setup.stage.name,
                units.len()
            ),
        );
        info!(
            "Battle started: stage {} '{}' ({} waves{}) with {} player units",
            setup.stage.chapter,
            setup.stage.name,
            setup.stage.waves,
            if setup.stage.has_boss { ", boss" } else { "" },
            units.len()
        );

        Ok(Self {
            units,
            player_castle,
            enemy_castle,
            modifiers: RogueliteModifierSet::new(),
            director,
            shop: BattleShop::new(),
            rng,
            catalog,
            stage: setup.stage,
            boss: setup.boss,
            gold: setup.gold,
            auto_battle: setup.auto_battle,
            speed: setup.speed,
            running: true,
            outcome: BattleOutcome::Ongoing,
            elapsed: 0.0,
            log,
            pending_events: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn outcome(&self) -> BattleOutcome {
        self.outcome
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop scheduling further ticks. Takes effect before the next tick.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn units(&self) -> &UnitTable {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut UnitTable {
        &mut self.units
    }

    pub fn player_castle(&self) -> &Castle {
        &self.player_castle
    }

    pub fn enemy_castle(&self) -> &Castle {
        &self.enemy_castle
    }

    pub fn enemy_castle_mut(&mut self) -> &mut Castle {
        &mut self.enemy_castle
    }

    pub fn player_castle_mut(&mut self) -> &mut Castle {
        &mut self.player_castle
    }

    pub fn modifiers(&self) -> &RogueliteModifierSet {
        &self.modifiers
    }

    pub fn director(&self) -> &WaveDirector {
        &self.director
    }

    pub fn shop(&self) -> &BattleShop {
        &self.shop
    }

    pub fn stage(&self) -> &StageConfig {
        &self.stage
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    pub fn speed(&self) -> SpeedMultiplier {
        self.speed
    }

    pub fn set_speed(&mut self, speed: SpeedMultiplier) {
        self.speed = speed;
    }

    pub fn combat_log(&self) -> &CombatLog {
        &self.log
    }

    pub fn rng_seed(&self) -> Option<u64> {
        self.rng.seed
    }

    /// Events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance one atomic tick of `dt` seconds (before the speed multiplier).
    /// Does nothing once the battle has stopped.
    pub fn tick(&mut self, dt: f32) -> BattleOutcome {
        if !self.running {
            return self.outcome;
        }
        let dt = dt * self.speed.factor();
        self.elapsed += dt;
        self.log.match_time = self.elapsed;

        let mut events = Vec::new();

        // Wave director
        let was_preparing = self.director.is_preparing();
        let taken = self.director.update(
            dt,
            &mut self.units,
            &self.stage,
            &self.catalog,
            &mut self.rng,
            self.gold,
            &mut events,
        );
        if !was_preparing && self.director.is_preparing() {
            self.shop.restock(&mut self.rng);
        }
        if let Some(choice) = taken {
            self.apply_choice(choice, &mut events);
        }

        // Auto-battle orders
        if self.auto_battle && !self.director.is_preparing() {
            let advance_to_y = self.enemy_castle.position.y + AUTO_ADVANCE_OFFSET;
            for unit in self
                .units
                .iter_mut()
                .filter(|u| u.team == Team::Player && u.is_alive() && u.target_position.is_none())
            {
                unit.target_position = Some(clamp_to_arena(Vec2::new(unit.position.x, advance_to_y)));
            }
        }

        // Unit updates
        {
            let mut ctx = UpdateContext {
                dt,
                modifiers: &self.modifiers,
                player_castle: &mut self.player_castle,
                rng: &mut self.rng,
                events: &mut events,
            };
            for index in 0..self.units.len() {
                update_unit(&mut self.units, index, &mut ctx);
            }
        }

        self.siege_pass(&mut events);

        if let Some(boss) = &self.boss {
            update_boss(
                &mut self.enemy_castle,
                boss,
                &mut self.units,
                dt,
                &mut self.rng,
                &mut events,
            );
        }

        self.evaluate_outcome(&mut events);

        for event in &events {
            self.log.record(event);
        }
        self.pending_events.extend(events);
        self.outcome
    }

    /// Units with no living enemy unit in attack range strike the opposing
    /// castle when it is in range.
    fn siege_pass(&mut self, events: &mut Vec<BattleEvent>) {
        let mut hits: Vec<(usize, Team)> = Vec::new();
        for (index, unit) in self.units.iter().enumerate() {
            if !unit.is_alive() {
                continue;
            }
            let range = unit.attack_range();
            let engaged = self
                .units
                .living_on(unit.team.opponent())
                .any(|enemy| enemy.position.distance(unit.position) < range);
            if engaged {
                continue;
            }
            let castle = match unit.team {
                Team::Player => &self.enemy_castle,
                Team::Enemy => &self.player_castle,
            };
            if !castle.is_destroyed() && unit.distance_to(castle.position) < range {
                hits.push((index, unit.team.opponent()));
            }
        }

        for (index, castle_team) in hits {
            let castle = match castle_team {
                Team::Player => &mut self.player_castle,
                Team::Enemy => &mut self.enemy_castle,
            };
            let unit = self.units.unit_at_mut(index);
            let applied = castle.take_damage(unit.siege_attack);
            if applied <= 0.0 {
                continue;
            }
            unit.damage_dealt += applied;
            events.push(BattleEvent::Damage(DamageEvent {
                source: Some(unit.id),
                source_name: unit.name.clone(),
                target: HitTarget::Castle(castle_team),
                target_name: castle.name().to_string(),
                amount: applied,
                ability_name: Some("Siege".to_string()),
                is_critical: false,
            }));
        }
    }

    fn evaluate_outcome(&mut self, events: &mut Vec<BattleEvent>) {
        let outcome = if self.player_castle.is_destroyed() || !self.units.any_living(Team::Player) {
            BattleOutcome::Defeat
        } else if self.enemy_castle.is_destroyed() {
            if self.director.all_waves_spawned() {
                BattleOutcome::StageComplete
            } else {
                BattleOutcome::Victory
            }
        } else if self.director.phase() == WavePhase::Completed {
            BattleOutcome::StageComplete
        } else {
            BattleOutcome::Ongoing
        };

        if outcome.is_terminal() {
            self.outcome = outcome;
            self.running = false;
            info!(
                "Battle ended after {:.1}s: {} (wave {}/{})",
                self.elapsed,
                outcome.name(),
                self.director.wave_number(),
                self.director.max_waves()
            );
            events.push(BattleEvent::BattleEnded { outcome });
        }
    }

    fn apply_choice(&mut self, choice: TakenChoice, events: &mut Vec<BattleEvent>) {
        let mut ctx = EventContext {
            units: &mut self.units,
            modifiers: &mut self.modifiers,
            next_wave: self.director.next_wave_modifiers_mut(),
            gold: &mut self.gold,
            rng: &mut self.rng,
        };
        let resolution = apply_event(choice.event, &mut ctx);
        if resolution.declined {
            warn!("Could not afford '{}'", choice.event.name());
        }
        events.push(BattleEvent::EventApplied {
            name: choice.event.name().to_string(),
            auto_selected: choice.auto_selected,
        });
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn living_player_unit(&mut self, id: UnitId) -> Result<&mut Unit, String> {
        match self.units.get_mut(id) {
            Some(unit) if unit.team == Team::Player && unit.is_alive() => Ok(unit),
            Some(_) => Err(format!("Unit {} cannot take orders", id)),
            None => Err(format!("Unknown unit {}", id)),
        }
    }

    /// Move a player unit. The destination is clamped into the arena.
    pub fn order_move(&mut self, id: UnitId, destination: Vec2) -> Result<(), String> {
        self.require_running()?;
        let unit = self.living_player_unit(id)?;
        unit.target_position = Some(clamp_to_arena(destination));
        Ok(())
    }

    /// Focus a player unit on a living enemy. Drops its move order.
    pub fn order_attack(&mut self, id: UnitId, target: UnitId) -> Result<(), String> {
        self.require_running()?;
        match self.units.living(target) {
            Some(enemy) if enemy.team == Team::Enemy => {}
            _ => return Err(format!("Unit {} is not a living enemy", target)),
        }
        let unit = self.living_player_unit(id)?;
        unit.target_enemy = Some(target);
        unit.target_position = None;
        Ok(())
    }

    pub fn set_auto_battle(&mut self, enabled: bool) {
        self.auto_battle = enabled;
    }

    pub fn auto_battle(&self) -> bool {
        self.auto_battle
    }

    /// Take one of the offered event choices. The next wave spawns on the following tick.
    pub fn choose_event(&mut self, index: usize) -> Result<WaveEvent, String> {
        self.require_running()?;
        let event = self.director.choose(index)?;
        let mut events = Vec::new();
        self.apply_choice(
            TakenChoice {
                event,
                auto_selected: false,
            },
            &mut events,
        );
        self.flush(events);
        Ok(event)
    }

    fn require_running(&self) -> Result<(), String> {
        if !self.running {
            return Err("The battle is over".to_string());
        }
        Ok(())
    }

    fn require_preparation(&self) -> Result<(), String> {
        self.require_running()?;
        if !self.director.is_preparing() {
            return Err("The shop is only open between waves".to_string());
        }
        Ok(())
    }

    /// Buy the item in a shop slot and apply it.
    pub fn buy_shop_item(&mut self, index: usize) -> Result<(), String> {
        self.require_preparation()?;
        let item = self.shop.purchase(index, &mut self.gold)?;

        let mut events = vec![BattleEvent::ShopPurchase {
            item: item.name().to_string(),
            cost: item.cost(),
        }];
        let heal = item.heal_amount();
        if heal > 0.0 {
            for unit in self.units.iter_mut().filter(|u| u.team == Team::Player) {
                let healed = unit.heal(heal);
                if healed > 0.0 {
                    events.push(BattleEvent::Healing(HealingEvent {
                        target: HitTarget::Unit(unit.id),
                        target_name: unit.name.clone(),
                        amount: healed,
                        cause: item.name().to_string(),
                    }));
                }
            }
        }
        self.modifiers.apply_shop(item, item.lasting_effects());
        info!("Bought {} for {} gold ({} left)", item.name(), item.cost(), self.gold);
        self.flush(events);
        Ok(())
    }

    pub fn toggle_shop_lock(&mut self, index: usize) -> Result<bool, String> {
        self.require_preparation()?;
        self.shop.toggle_lock(index)
    }

    pub fn refresh_shop(&mut self) -> Result<(), String> {
        self.require_preparation()?;
        self.shop.refresh(&mut self.gold, &mut self.rng)?;
        self.flush(vec![BattleEvent::ShopRefreshed {
            cost: SHOP_REFRESH_COST,
        }]);
        Ok(())
    }

    fn flush(&mut self, events: Vec<BattleEvent>) {
        for event in &events {
            self.log.record(event);
        }
        self.pending_events.extend(events);
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> BattleSnapshot {
        let units = self
            .units
            .iter()
            .filter(|unit| unit.is_alive())
            .map(|unit| UnitView {
                id: unit.id,
                name: unit.name.clone(),
                team: unit.team,
                category: unit.category,
                position: (unit.position.x, unit.position.y),
                hp: unit.hp,
                max_hp: unit.max_hp,
                stunned: unit.status.stunned,
                slowed: unit.status.is_slowed(),
                skill_ready: unit.skill_state.ready,
                skill_cooldown_remaining: unit.skill_state.cooldown_remaining,
                target: unit.target_enemy,
            })
            .collect();

        let preparation = match self.director.phase() {
            WavePhase::Preparing { countdown } => Some(PreparationView {
                next_wave: self.director.wave_number() + 1,
                countdown,
                choices: self
                    .director
                    .pending_choices()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect(),
                shop: self
                    .shop
                    .slots()
                    .iter()
                    .map(|slot| (slot.item.name().to_string(), slot.item.cost(), slot.locked))
                    .collect(),
            }),
            _ => None,
        };

        BattleSnapshot {
            elapsed: self.elapsed,
            outcome: self.outcome,
            wave: self.director.wave_number(),
            max_waves: self.director.max_waves(),
            boss_phase: self.enemy_castle.boss_phase().map(|phase| phase.number()),
            player_castle: (&self.player_castle).into(),
            enemy_castle: (&self.enemy_castle).into(),
            units,
            preparation,
            gold: self.gold,
            auto_battle: self.auto_battle,
            active_buffs: self
                .modifiers
                .active_buffs()
                .iter()
                .map(|b| b.name().to_string())
                .collect(),
            active_curses: self
                .modifiers
                .active_curses()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::stage_config::StageCatalog;

    fn setup() -> BattleSetup {
        let stage = StageCatalog::default().stage(1).unwrap().clone();
        BattleSetup::new(
            vec![CombatantSpec::new("Guard", Category::Pierce, 100.0, 20.0, 3.0)],
            stage,
        )
    }

    #[test]
    fn test_empty_roster_rejected_before_start() {
        let mut bad = setup();
        bad.roster.clear();
        let result = BattleSimulation::new(bad, SkillCatalog::default(), GameRng::from_seed(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_roster_rejected() {
        let mut bad = setup();
        bad.roster = vec![bad.roster[0].clone(); 4];
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_boss_stage_requires_boss_config() {
        let mut bad = setup();
        bad.stage.has_boss = true;
        assert!(bad.validate().is_err());
        bad.boss = Some(StageCatalog::default().boss);
        assert!(bad.validate().is_ok());
    }

    #[test]
    fn test_speed_multiplier_scales_elapsed_time() {
        let mut sim =
            BattleSimulation::new(setup(), SkillCatalog::default(), GameRng::from_seed(1)).unwrap();
        sim.set_speed(SpeedMultiplier::X3);
        sim.tick(0.016);
        assert!((sim.elapsed() - 0.048).abs() < 1e-6);
    }

    #[test]
    fn test_stopped_simulation_does_not_tick() {
        let mut sim =
            BattleSimulation::new(setup(), SkillCatalog::default(), GameRng::from_seed(1)).unwrap();
        sim.stop();
        sim.tick(0.016);
        assert_eq!(sim.elapsed(), 0.0);
        assert_eq!(sim.director().wave_number(), 0);
    }

    #[test]
    fn test_roster_gets_player_bonus() {
        let sim =
            BattleSimulation::new(setup(), SkillCatalog::default(), GameRng::from_seed(1)).unwrap();
        let unit = sim.units().iter().next().unwrap();
        assert_eq!(unit.max_hp, 105.0);
        assert_eq!(unit.attack, 21.0);
    }
}
