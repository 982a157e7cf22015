//! Recipe state: the items an altar still needs and how many it has.

use serde::{Deserialize, Serialize};

use crate::item::ItemStack;

/// One required item with target and accumulated quantities.
///
/// `current_amount <= amount_required` always holds; deserialization clamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RequiredItemRepr")]
pub struct RequiredItem {
    item: String,
    amount_required: u32,
    current_amount: u32,
}

#[derive(Deserialize)]
struct RequiredItemRepr {
    item: String,
    amount_required: u32,
    #[serde(default)]
    current_amount: u32,
}

impl From<RequiredItemRepr> for RequiredItem {
    fn from(r: RequiredItemRepr) -> Self {
        Self {
            item: r.item,
            amount_required: r.amount_required,
            current_amount: r.current_amount.min(r.amount_required),
        }
    }
}

impl RequiredItem {
    pub fn new(item: impl Into<String>, amount_required: u32) -> Self {
        Self {
            item: item.into(),
            amount_required,
            current_amount: 0,
        }
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn amount_required(&self) -> u32 {
        self.amount_required
    }

    pub fn current_amount(&self) -> u32 {
        self.current_amount
    }

    /// Quantity still missing.
    pub fn remaining(&self) -> u32 {
        self.amount_required - self.current_amount
    }

    pub fn reached_amount_required(&self) -> bool {
        self.current_amount >= self.amount_required
    }

    pub fn is_item_equal(&self, stack: &ItemStack) -> bool {
        !stack.is_empty() && stack.item == self.item
    }

    /// Items left over if a stack of `count` were offered.
    pub fn excess(&self, count: u32) -> u32 {
        count.saturating_sub(self.remaining())
    }

    /// Take as much of `count` as still needed. Returns the part not taken.
    pub fn absorb(&mut self, count: u32) -> u32 {
        let excess = self.excess(count);
        if excess > 0 {
            self.current_amount = self.amount_required;
        } else {
            self.current_amount += count;
        }
        excess
    }
}

/// Ordered list of requirements for one owner's altar run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltarRecipe {
    required_items: Vec<RequiredItem>,
}

impl AltarRecipe {
    pub fn new(required_items: Vec<RequiredItem>) -> Self {
        Self { required_items }
    }

    pub fn required_items(&self) -> &[RequiredItem] {
        &self.required_items
    }

    pub fn is_empty(&self) -> bool {
        self.required_items.is_empty()
    }

    /// All requirements met. An empty recipe is trivially satisfied.
    pub fn satisfied(&self) -> bool {
        self.required_items
            .iter()
            .all(RequiredItem::reached_amount_required)
    }

    /// Whether any unmet requirement accepts this stack.
    pub fn accepts(&self, stack: &ItemStack) -> bool {
        self.required_items
            .iter()
            .any(|r| !r.reached_amount_required() && r.is_item_equal(stack))
    }

    /// First unmet requirement matching the stack. Later matches are never
    /// considered for the same stack in the same pass.
    pub fn first_unmet_match(&mut self, stack: &ItemStack) -> Option<&mut RequiredItem> {
        self.required_items
            .iter_mut()
            .find(|r| !r.reached_amount_required() && r.is_item_equal(stack))
    }
}
