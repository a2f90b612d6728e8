//! Battle Constants
//!
//! Centralized location for the numbers that balance the siege battle.
//! Catalog data (skills, stages, boss abilities) lives in `assets/config`;
//! everything here is structural and shared by every stage.

// ============================================================================
// Timing
// ============================================================================

/// Reference tick length in seconds (~60 Hz). Movement speeds are expressed in
/// arena units per reference tick.
pub const TICK_SECS: f32 = 0.016;

/// Preparation countdown between waves, in seconds.
pub const PREP_COUNTDOWN_SECS: f32 = 3.0;

// ============================================================================
// Arena
// ============================================================================

/// Arena bounds shared by both teams. There is no lane separation.
pub const ARENA_MIN_X: f32 = 30.0;
pub const ARENA_MAX_X: f32 = 970.0;
pub const ARENA_MIN_Y: f32 = 65.0;
pub const ARENA_MAX_Y: f32 = 540.0;

pub const PLAYER_CASTLE_POS: (f32, f32) = (500.0, 550.0);
pub const ENEMY_CASTLE_POS: (f32, f32) = (500.0, 100.0);

/// Spawn columns used by both the roster and enemy waves.
pub const SPAWN_COLUMNS: [f32; 3] = [300.0, 500.0, 700.0];
pub const PLAYER_SPAWN_Y: f32 = 480.0;
pub const ENEMY_SPAWN_Y: f32 = 150.0;
pub const FRIEND_ASSIST_POS: (f32, f32) = (500.0, 500.0);

/// Auto battle marches player units to this distance in front of the enemy castle.
pub const AUTO_ADVANCE_OFFSET: f32 = 80.0;

// ============================================================================
// Combat
// ============================================================================

/// Normal attack ranges per category.
pub const PIERCE_ATTACK_RANGE: f32 = 60.0;
pub const CHARGE_ATTACK_RANGE: f32 = 50.0;
pub const RANGED_ATTACK_RANGE: f32 = 120.0;

/// Damage multiplier when the attacker's category beats the defender's.
pub const TYPE_ADVANTAGE_MULTIPLIER: f32 = 1.2;

/// Damage multiplier applied by a critical strike.
pub const CRIT_DAMAGE_MULTIPLIER: f32 = 1.5;

/// Siege attack as a fraction of a unit's attack, fixed at creation.
pub const SIEGE_ATTACK_FRACTION: f32 = 0.7;

/// Roster units fight 5% above their computed stats.
pub const PLAYER_TEAM_STAT_BONUS: f32 = 1.05;

pub const MAX_ROSTER_SIZE: usize = 3;

// ============================================================================
// Castles & Boss
// ============================================================================

pub const CASTLE_MAX_HP: f32 = 500.0;
pub const BOSS_MAX_HP: f32 = 1500.0;

/// Phase 2 begins once boss hp is at or below this value.
pub const BOSS_PHASE_TWO_HP: f32 = 1000.0;

/// Phase 3 begins once boss hp is at or below this value.
pub const BOSS_PHASE_THREE_HP: f32 = 500.0;

/// Execute hits units under the threshold for this multiple of the ability damage.
pub const EXECUTE_DAMAGE_MULTIPLIER: f32 = 2.0;

// ============================================================================
// Waves
// ============================================================================

pub const ENEMY_HP_PER_WAVE: f32 = 20.0;
pub const ENEMY_ATTACK_PER_WAVE: f32 = 3.0;

/// Per-category hp factors applied to a wave's base hp (spear, cavalry, bow).
pub const ENEMY_HP_FACTORS: [f32; 3] = [0.56, 0.7, 0.49];

/// Attack factor applied to a wave's base attack.
pub const ENEMY_ATTACK_FACTOR: f32 = 0.7;

/// Number of event choices offered during preparation.
pub const EVENT_CHOICE_COUNT: usize = 3;
pub const BUFF_CANDIDATES: usize = 2;
pub const CURSE_CANDIDATES: usize = 1;

/// Chance that a trade replaces one of the offered choices.
pub const TRADE_OFFER_CHANCE: f32 = 0.4;

/// Minimum gold before a trade can be offered.
pub const TRADE_MIN_GOLD: u32 = 50;

// ============================================================================
// Shop
// ============================================================================

pub const SHOP_STOCK_SIZE: usize = 5;
pub const SHOP_REFRESH_COST: u32 = 50;
