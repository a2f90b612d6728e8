//! Between-wave shop
//!
//! A stock of distinct items that can be bought with gold during preparation.
//! Items can be locked so they survive the next restock; a paid refresh keeps
//! locked items and rerolls the rest.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use super::components::GameRng;
use super::constants::{SHOP_REFRESH_COST, SHOP_STOCK_SIZE};
use super::modifiers::ModifierStat;

/// Everything the shop can sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopItemKind {
    SmallPotion,
    AttackDraught,
    WardCharm,
    SwiftBoots,
    MediumPotion,
    Elixir,
}

impl ShopItemKind {
    pub fn all() -> &'static [ShopItemKind] {
        &[
            ShopItemKind::SmallPotion,
            ShopItemKind::AttackDraught,
            ShopItemKind::WardCharm,
            ShopItemKind::SwiftBoots,
            ShopItemKind::MediumPotion,
            ShopItemKind::Elixir,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShopItemKind::SmallPotion => "Small Potion",
            ShopItemKind::AttackDraught => "Attack Draught",
            ShopItemKind::WardCharm => "Ward Charm",
            ShopItemKind::SwiftBoots => "Swift Boots",
            ShopItemKind::MediumPotion => "Medium Potion",
            ShopItemKind::Elixir => "Elixir",
        }
    }

    pub fn cost(&self) -> u32 {
        match self {
            ShopItemKind::SmallPotion => 80,
            ShopItemKind::AttackDraught => 120,
            ShopItemKind::WardCharm => 100,
            ShopItemKind::SwiftBoots => 110,
            ShopItemKind::MediumPotion => 150,
            ShopItemKind::Elixir => 200,
        }
    }

    /// Flat hp restored to every living player unit.
    pub fn heal_amount(&self) -> f32 {
        match self {
            ShopItemKind::SmallPotion => 150.0,
            ShopItemKind::MediumPotion => 250.0,
            ShopItemKind::Elixir => 100.0,
            _ => 0.0,
        }
    }

    /// Battle-long modifier contributions.
    pub fn lasting_effects(&self) -> SmallVec<[(ModifierStat, f32); 2]> {
        match self {
            ShopItemKind::AttackDraught => smallvec![(ModifierStat::AttackScale, 0.2)],
            ShopItemKind::WardCharm => smallvec![(ModifierStat::DamageReduction, 0.15)],
            ShopItemKind::SwiftBoots => smallvec![(ModifierStat::SpeedScale, 0.3)],
            ShopItemKind::Elixir => smallvec![(ModifierStat::AttackScale, 0.3)],
            ShopItemKind::SmallPotion | ShopItemKind::MediumPotion => SmallVec::new(),
        }
    }
}

/// One slot of the shop stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShopSlot {
    pub item: ShopItemKind,
    pub locked: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BattleShop {
    slots: Vec<ShopSlot>,
    pub refresh_count: u32,
}

impl BattleShop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[ShopSlot] {
        &self.slots
    }

    /// Restock for a new preparation phase. Locked items carry over and
    /// stay locked; the remaining slots are filled with other items.
    pub fn restock(&mut self, rng: &mut GameRng) {
        self.slots.retain(|slot| slot.locked);
        self.fill(rng);
    }

    /// Paid reroll. Locked items are kept (and unlocked), the rest rerolled.
    pub fn refresh(&mut self, gold: &mut u32, rng: &mut GameRng) -> Result<(), String> {
        if *gold < SHOP_REFRESH_COST {
            return Err(format!(
                "Refreshing costs {} gold, only {} available",
                SHOP_REFRESH_COST, gold
            ));
        }
        *gold -= SHOP_REFRESH_COST;
        self.slots.retain(|slot| slot.locked);
        for slot in &mut self.slots {
            slot.locked = false;
        }
        self.fill(rng);
        self.refresh_count += 1;
        Ok(())
    }

    /// Toggle the lock on a slot. Returns the new lock state.
    pub fn toggle_lock(&mut self, index: usize) -> Result<bool, String> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| format!("No shop item at slot {}", index))?;
        slot.locked = !slot.locked;
        Ok(slot.locked)
    }

    /// Pay for the item in a slot. Locked items cannot be bought.
    pub fn purchase(&self, index: usize, gold: &mut u32) -> Result<ShopItemKind, String> {
        let slot = self
            .slots
            .get(index)
            .ok_or_else(|| format!("No shop item at slot {}", index))?;
        if slot.locked {
            return Err(format!("{} is locked", slot.item.name()));
        }
        let cost = slot.item.cost();
        if *gold < cost {
            return Err(format!(
                "{} costs {} gold, only {} available",
                slot.item.name(),
                cost,
                gold
            ));
        }
        *gold -= cost;
        Ok(slot.item)
    }

    fn fill(&mut self, rng: &mut GameRng) {
        let candidates: Vec<ShopItemKind> = ShopItemKind::all()
            .iter()
            .copied()
            .filter(|item| !self.slots.iter().any(|slot| slot.item == *item))
            .collect();
        let needed = SHOP_STOCK_SIZE.saturating_sub(self.slots.len());
        for item in rng.sample(&candidates, needed) {
            self.slots.push(ShopSlot {
                item,
                locked: false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_duplicates(shop: &BattleShop) -> bool {
        let slots = shop.slots();
        slots
            .iter()
            .enumerate()
            .any(|(i, a)| slots[i + 1..].iter().any(|b| a.item == b.item))
    }

    #[test]
    fn test_restock_fills_distinct_items() {
        let mut rng = GameRng::from_seed(4);
        let mut shop = BattleShop::new();
        shop.restock(&mut rng);
        assert_eq!(shop.slots().len(), SHOP_STOCK_SIZE);
        assert!(!has_duplicates(&shop));
    }

    #[test]
    fn test_refresh_keeps_locked_item_and_clears_lock() {
        let mut rng = GameRng::from_seed(8);
        let mut shop = BattleShop::new();
        shop.restock(&mut rng);
        let kept = shop.slots()[2].item;
        assert_eq!(shop.toggle_lock(2), Ok(true));

        let mut gold = 120;
        shop.refresh(&mut gold, &mut rng).unwrap();

        assert_eq!(gold, 70);
        assert_eq!(shop.slots()[0].item, kept);
        assert!(shop.slots().iter().all(|slot| !slot.locked));
        assert!(!has_duplicates(&shop));
    }

    #[test]
    fn test_refresh_requires_gold() {
        let mut rng = GameRng::from_seed(8);
        let mut shop = BattleShop::new();
        shop.restock(&mut rng);
        let before: Vec<_> = shop.slots().to_vec();
        let mut gold = 49;
        assert!(shop.refresh(&mut gold, &mut rng).is_err());
        assert_eq!(gold, 49);
        assert_eq!(shop.slots(), before.as_slice());
    }

    #[test]
    fn test_purchase_spends_gold() {
        let mut rng = GameRng::from_seed(2);
        let mut shop = BattleShop::new();
        shop.restock(&mut rng);
        let item = shop.slots()[0].item;
        let mut gold = 500;
        assert_eq!(shop.purchase(0, &mut gold), Ok(item));
        assert_eq!(gold, 500 - item.cost());
    }

    #[test]
    fn test_locked_and_unaffordable_items_are_refused() {
        let mut rng = GameRng::from_seed(2);
        let mut shop = BattleShop::new();
        shop.restock(&mut rng);

        let mut gold = 10;
        assert!(shop.purchase(0, &mut gold).is_err());
        assert_eq!(gold, 10);

        shop.toggle_lock(1).unwrap();
        let mut rich = 1000;
        assert!(shop.purchase(1, &mut rich).is_err());
        assert_eq!(rich, 1000);
        assert!(shop.purchase(99, &mut rich).is_err());
    }

    #[test]
    fn test_potions_have_no_lasting_effect() {
        assert!(ShopItemKind::SmallPotion.lasting_effects().is_empty());
        assert_eq!(ShopItemKind::Elixir.heal_amount(), 100.0);
        assert_eq!(ShopItemKind::Elixir.lasting_effects().len(), 1);
    }
}
