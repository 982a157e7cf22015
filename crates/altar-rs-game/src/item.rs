//! Item stacks as seen by the altar.
//!
//! An item is identified by its namespaced name (`"the_vault:vault_rock"`).
//! `count == 0` means the stack is empty.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Namespaced item identifier.
    pub item: String,
    /// Number of items in the stack.
    pub count: u32,
}

impl ItemStack {
    /// An empty stack.
    pub fn empty() -> Self {
        Self {
            item: String::new(),
            count: 0,
        }
    }

    pub fn new(item: impl Into<String>, count: u32) -> Self {
        Self {
            item: item.into(),
            count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.item.is_empty()
    }

    /// Whether both stacks hold the same item, ignoring counts.
    pub fn is_same_item(&self, other: &ItemStack) -> bool {
        self.item == other.item
    }

    /// Copy of this stack with a different count (empty when `count == 0`).
    pub fn with_count(&self, count: u32) -> Self {
        if count == 0 {
            return Self::empty();
        }
        Self {
            item: self.item.clone(),
            count,
        }
    }
}
