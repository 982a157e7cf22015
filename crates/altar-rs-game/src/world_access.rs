//! The world capabilities an altar needs.
//!
//! The altar never touches a concrete world. Anything that can answer a
//! bounded query for loose items, push/resize/remove them, and spawn new ones
//! can host altars. [`GameWorld`](crate::game_world::GameWorld) is the ECS
//! implementation used by the server.

use crate::geometry::{Aabb, Vec3};
use crate::item::ItemStack;

/// Runtime ID of a loose item entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemEntityId(pub u64);

/// Snapshot of a loose item entity, valid for the current tick only.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEntityView {
    pub id: ItemEntityId,
    pub position: Vec3,
    pub stack: ItemStack,
}

pub trait WorldAccess {
    /// `false` on observer replicas, which must not simulate.
    fn is_authoritative(&self) -> bool;

    /// Monotonic world tick counter.
    fn game_time(&self) -> u64;

    /// Loose items whose position lies inside `bounds`. Order is unspecified.
    fn items_within(&self, bounds: &Aabb) -> Vec<ItemEntityView>;

    /// Current state of a single item, if it still exists.
    fn item(&self, id: ItemEntityId) -> Option<ItemEntityView>;

    /// Add `impulse` to the item's velocity.
    fn push_item(&mut self, id: ItemEntityId, impulse: Vec3);

    /// Shrink or grow the item's stack. A count of 0 removes it.
    fn set_item_count(&mut self, id: ItemEntityId, count: u32);

    fn remove_item(&mut self, id: ItemEntityId);

    fn spawn_item(&mut self, position: Vec3, stack: ItemStack) -> ItemEntityId;
}
