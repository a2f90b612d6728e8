//! Between-wave events
//!
//! During preparation the player is offered a handful of events drawn from
//! four pools: base events, roguelite buffs, roguelite curses and, now and
//! then, a trade that costs gold.

use bevy::prelude::*;
use serde::Serialize;

use super::components::{GameRng, Team};
use super::constants::{
    BUFF_CANDIDATES, CURSE_CANDIDATES, EVENT_CHOICE_COUNT, TRADE_MIN_GOLD, TRADE_OFFER_CHANCE,
};
use super::modifiers::{RogueliteBuff, RogueliteCurse, RogueliteModifierSet};
use super::unit::UnitTable;

/// Fraction of max hp restored by the supply event.
const SUPPLY_HEAL_FRACTION: f32 = 0.25;
/// Enemy attack multiplier for the next wave after a trap.
const TRAP_ATTACK_SCALE: f32 = 0.8;
/// Speed multiplier applied by the storm (player units now, enemies next wave).
const STORM_SPEED_SCALE: f32 = 0.7;

/// Events that change unit stats or the next wave directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BaseEvent {
    /// Heal every living player unit
    Supply,
    /// Weaken the next wave's attack
    Trap,
    /// One fewer enemy next wave
    Ambush,
    /// Slow everyone
    Storm,
}

impl BaseEvent {
    pub fn all() -> &'static [BaseEvent] {
        &[
            BaseEvent::Supply,
            BaseEvent::Trap,
            BaseEvent::Ambush,
            BaseEvent::Storm,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BaseEvent::Supply => "Supply Wagon: heal 25%",
            BaseEvent::Trap => "Set Traps: enemy attack -20%",
            BaseEvent::Ambush => "Ambush: one fewer enemy",
            BaseEvent::Storm => "Storm: everyone slowed 30%",
        }
    }
}

/// Gold-for-effect offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TradeOffer {
    /// Two distinct random buffs
    BloodPact,
    /// Remove the oldest curse
    Merchant,
    /// Coin flip between a buff and a curse
    Gambler,
}

impl TradeOffer {
    pub fn all() -> &'static [TradeOffer] {
        &[TradeOffer::BloodPact, TradeOffer::Merchant, TradeOffer::Gambler]
    }

    pub fn cost(&self) -> u32 {
        match self {
            TradeOffer::BloodPact => 100,
            TradeOffer::Merchant => 80,
            TradeOffer::Gambler => 50,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TradeOffer::BloodPact => "Blood Pact: two buffs for 100 gold",
            TradeOffer::Merchant => "Merchant: lift a curse for 80 gold",
            TradeOffer::Gambler => "Gambler: buff or curse for 50 gold",
        }
    }
}

/// One offered choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WaveEvent {
    Base(BaseEvent),
    Buff(RogueliteBuff),
    Curse(RogueliteCurse),
    Trade(TradeOffer),
}

impl WaveEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WaveEvent::Base(event) => event.name(),
            WaveEvent::Buff(buff) => buff.name(),
            WaveEvent::Curse(curse) => curse.name(),
            WaveEvent::Trade(trade) => trade.name(),
        }
    }
}

/// Modifiers applied to the next spawned wave, then reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NextWaveModifiers {
    pub enemy_attack_scale: f32,
    pub enemy_speed_scale: f32,
    pub fewer_enemies: usize,
}

impl Default for NextWaveModifiers {
    fn default() -> Self {
        Self {
            enemy_attack_scale: 1.0,
            enemy_speed_scale: 1.0,
            fewer_enemies: 0,
        }
    }
}

/// Draw the choices for a preparation phase.
pub fn draw_event_choices(rng: &mut GameRng, gold: u32) -> Vec<WaveEvent> {
    let mut pool: Vec<WaveEvent> = BaseEvent::all().iter().map(|e| WaveEvent::Base(*e)).collect();
    pool.extend(
        rng.sample(RogueliteBuff::all(), BUFF_CANDIDATES)
            .into_iter()
            .map(WaveEvent::Buff),
    );
    pool.extend(
        rng.sample(RogueliteCurse::all(), CURSE_CANDIDATES)
            .into_iter()
            .map(WaveEvent::Curse),
    );

    let mut choices = rng.sample(&pool, EVENT_CHOICE_COUNT);

    if gold >= TRADE_MIN_GOLD && rng.roll(TRADE_OFFER_CHANCE) {
        if let (Some(slot), Some(trade)) = (
            rng.random_index(choices.len()),
            rng.sample(TradeOffer::all(), 1).first().copied(),
        ) {
            choices[slot] = WaveEvent::Trade(trade);
        }
    }

    choices
}

/// What applying an event actually did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventResolution {
    pub gold_spent: u32,
    pub buffs_gained: Vec<RogueliteBuff>,
    pub curses_gained: Vec<RogueliteCurse>,
    pub curse_removed: Option<RogueliteCurse>,
    /// Trades that could not be paid for apply nothing
    pub declined: bool,
}

/// State an event can touch.
pub struct EventContext<'a> {
    pub units: &'a mut UnitTable,
    pub modifiers: &'a mut RogueliteModifierSet,
    pub next_wave: &'a mut NextWaveModifiers,
    pub gold: &'a mut u32,
    pub rng: &'a mut GameRng,
}

pub fn apply_event(event: WaveEvent, ctx: &mut EventContext) -> EventResolution {
    let mut resolution = EventResolution::default();

    match event {
        WaveEvent::Base(BaseEvent::Supply) => {
            for unit in ctx.units.iter_mut().filter(|u| u.team == Team::Player) {
                let amount = unit.max_hp * SUPPLY_HEAL_FRACTION;
                unit.heal(amount);
            }
        }
        WaveEvent::Base(BaseEvent::Trap) => {
            ctx.next_wave.enemy_attack_scale *= TRAP_ATTACK_SCALE;
        }
        WaveEvent::Base(BaseEvent::Ambush) => {
            ctx.next_wave.fewer_enemies += 1;
        }
        WaveEvent::Base(BaseEvent::Storm) => {
            for unit in ctx
                .units
                .iter_mut()
                .filter(|u| u.team == Team::Player && u.is_alive())
            {
                unit.move_speed *= STORM_SPEED_SCALE;
            }
            ctx.next_wave.enemy_speed_scale *= STORM_SPEED_SCALE;
        }
        WaveEvent::Buff(buff) => {
            ctx.modifiers.apply_buff(buff);
            resolution.buffs_gained.push(buff);
        }
        WaveEvent::Curse(curse) => {
            ctx.modifiers.apply_curse(curse);
            resolution.curses_gained.push(curse);
        }
        WaveEvent::Trade(trade) => apply_trade(trade, ctx, &mut resolution),
    }

    info!("Applied event: {}", event.name());
    resolution
}

fn apply_trade(trade: TradeOffer, ctx: &mut EventContext, resolution: &mut EventResolution) {
    let cost = trade.cost();
    let affordable = *ctx.gold >= cost;
    let useful = match trade {
        TradeOffer::Merchant => !ctx.modifiers.active_curses().is_empty(),
        _ => true,
    };
    if !affordable || !useful {
        debug!("Trade '{}' declined (gold {})", trade.name(), ctx.gold);
        resolution.declined = true;
        return;
    }

    *ctx.gold -= cost;
    resolution.gold_spent = cost;

    match trade {
        TradeOffer::BloodPact => {
            for buff in ctx.rng.sample(RogueliteBuff::all(), 2) {
                ctx.modifiers.apply_buff(buff);
                resolution.buffs_gained.push(buff);
            }
        }
        TradeOffer::Merchant => {
            resolution.curse_removed = ctx.modifiers.remove_oldest_curse();
        }
        TradeOffer::Gambler => {
            if ctx.rng.roll(0.5) {
                if let Some(buff) = ctx.rng.sample(RogueliteBuff::all(), 1).first().copied() {
                    ctx.modifiers.apply_buff(buff);
                    resolution.buffs_gained.push(buff);
                }
            } else if let Some(curse) = ctx.rng.sample(RogueliteCurse::all(), 1).first().copied() {
                ctx.modifiers.apply_curse(curse);
                resolution.curses_gained.push(curse);
            }
        }
    }
}
