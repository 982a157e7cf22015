//! Weighted reward table for finished infusions.

use rand::Rng;
use serde::Deserialize;

use crate::item::ItemStack;

/// One possible reward.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RewardEntry {
    pub item: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_count() -> u32 {
    1
}

fn default_weight() -> u32 {
    1
}

impl RewardEntry {
    pub fn new(item: impl Into<String>, count: u32, weight: u32) -> Self {
        Self {
            item: item.into(),
            count,
            weight,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewardTable {
    entries: Vec<RewardEntry>,
}

impl RewardTable {
    pub fn new(entries: Vec<RewardEntry>) -> Self {
        Self { entries }
    }

    /// Vault crystals, rarer tiers less likely.
    pub fn vault_crystals() -> Self {
        Self::new(vec![
            RewardEntry::new("the_vault:vault_crystal_normal", 1, 60),
            RewardEntry::new("the_vault:vault_crystal_rare", 1, 25),
            RewardEntry::new("the_vault:vault_crystal_epic", 1, 12),
            RewardEntry::new("the_vault:vault_crystal_omega", 1, 3),
        ])
    }

    pub fn entries(&self) -> &[RewardEntry] {
        &self.entries
    }

    /// Sum of all weights, saturating at `u32::MAX`.
    pub fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |total, e| total.saturating_add(e.weight))
    }

    /// Pick one entry by weight. `None` if the table has no weight at all.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ItemStack> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }

        let mut roll = rng.gen_range(0..total);
        for entry in &self.entries {
            if roll < entry.weight {
                return Some(ItemStack::new(entry.item.clone(), entry.count.max(1)));
            }
            roll -= entry.weight;
        }

        None
    }
}
