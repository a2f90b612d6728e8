//! Core battle data types
//!
//! Teams, unit categories, unit handles and the seeded random number generator
//! shared by every part of the simulation.

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::constants::{
    CHARGE_ATTACK_RANGE, PIERCE_ATTACK_RANGE, RANGED_ATTACK_RANGE, TYPE_ADVANTAGE_MULTIPLIER,
};

// ============================================================================
// Resources
// ============================================================================

/// Seeded random number generator for deterministic battle simulation.
///
/// When a seed is provided (e.g., via headless config), the same seed will
/// always produce the same battle outcome. Without a seed, uses system entropy.
#[derive(Resource, Debug)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Roll against a probability. Never succeeds for `chance <= 0`.
    pub fn roll(&mut self, chance: f32) -> bool {
        chance > 0.0 && self.random_f32() < chance
    }

    /// Pick a random index into a collection of `len` items. `None` when empty.
    pub fn random_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.rng.gen_range(0..len))
        }
    }

    /// Sample up to `amount` distinct items, in random order.
    pub fn sample<T: Clone>(&mut self, items: &[T], amount: usize) -> Vec<T> {
        items
            .choose_multiple(&mut self.rng, amount.min(items.len()))
            .cloned()
            .collect()
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

// ============================================================================
// Teams & Categories
// ============================================================================

/// The two opposing forces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Player => Team::Enemy,
            Team::Enemy => Team::Player,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Team::Player => "Player",
            Team::Enemy => "Enemy",
        }
    }
}

/// Combatant archetype. Determines base attack range, type advantage and skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Spear infantry
    Pierce,
    /// Cavalry
    Charge,
    /// Bowmen
    Ranged,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[Category::Pierce, Category::Charge, Category::Ranged]
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Category::Pierce => "Spear",
            Category::Charge => "Cavalry",
            Category::Ranged => "Bow",
        }
    }

    /// Normal attack range for this category.
    pub fn attack_range(&self) -> f32 {
        match self {
            Category::Pierce => PIERCE_ATTACK_RANGE,
            Category::Charge => CHARGE_ATTACK_RANGE,
            Category::Ranged => RANGED_ATTACK_RANGE,
        }
    }

    /// The category this one has the advantage over.
    pub fn beats(&self) -> Category {
        match self {
            Category::Pierce => Category::Charge,
            Category::Charge => Category::Ranged,
            Category::Ranged => Category::Pierce,
        }
    }

    /// Type advantage multiplier for an attack from `self` against `defender`.
    pub fn advantage_against(&self, defender: Category) -> f32 {
        if self.beats() == defender {
            TYPE_ADVANTAGE_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Parse a category from its variant or display name.
    pub fn parse(name: &str) -> Result<Category, String> {
        match name {
            "Pierce" | "Spear" => Ok(Category::Pierce),
            "Charge" | "Cavalry" => Ok(Category::Charge),
            "Ranged" | "Bow" => Ok(Category::Ranged),
            _ => Err(format!(
                "Unknown category: '{}'. Valid categories: Pierce, Charge, Ranged",
                name
            )),
        }
    }
}

// ============================================================================
// Handles
// ============================================================================

/// Stable handle to a unit in the battle's unit table.
///
/// Handles are never reused within a battle, so a handle to a unit that has
/// been cleaned up simply fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Clamp a position into the shared arena rectangle.
pub fn clamp_to_arena(pos: Vec2) -> Vec2 {
    use super::constants::{ARENA_MAX_X, ARENA_MAX_Y, ARENA_MIN_X, ARENA_MIN_Y};
    Vec2::new(
        pos.x.clamp(ARENA_MIN_X, ARENA_MAX_X),
        pos.y.clamp(ARENA_MIN_Y, ARENA_MAX_Y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut a = GameRng::from_seed(7);
        let mut b = GameRng::from_seed(7);
        for _ in 0..16 {
            assert_eq!(a.random_f32(), b.random_f32());
        }
    }

    #[test]
    fn test_random_index_handles_empty() {
        let mut rng = GameRng::from_seed(1);
        assert_eq!(rng.random_index(0), None);
        assert_eq!(rng.random_index(1), Some(0));
    }

    #[test]
    fn test_sample_never_exceeds_input() {
        let mut rng = GameRng::from_seed(3);
        let picked = rng.sample(&[1, 2], 5);
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn test_roll_zero_chance_never_succeeds() {
        let mut rng = GameRng::from_seed(9);
        assert!((0..100).all(|_| !rng.roll(0.0)));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("Bow"), Ok(Category::Ranged));
        assert_eq!(Category::parse("Charge"), Ok(Category::Charge));
        assert!(Category::parse("Catapult").is_err());
    }

    #[test]
    fn test_clamp_to_arena() {
        let clamped = clamp_to_arena(Vec2::new(-100.0, 9999.0));
        assert_eq!(clamped, Vec2::new(30.0, 540.0));
    }
}
