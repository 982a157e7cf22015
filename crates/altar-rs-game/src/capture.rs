//! Absorbing an attracted item into a requirement once it is close enough.

use tracing::debug;

use crate::geometry::Vec3;
use crate::recipe::RequiredItem;
use crate::world_access::{ItemEntityView, WorldAccess};

/// What happened to an item offered to a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Still outside the capture radius; nothing changed.
    OutOfRange,
    /// The whole stack was absorbed and the entity removed.
    Consumed { amount: u32 },
    /// The requirement was filled; the entity survives with `remaining` items.
    Split { amount: u32, remaining: u32 },
}

impl CaptureOutcome {
    pub fn is_captured(&self) -> bool {
        !matches!(self, CaptureOutcome::OutOfRange)
    }

    /// Items moved into the requirement.
    pub fn amount(&self) -> u32 {
        match self {
            CaptureOutcome::OutOfRange => 0,
            CaptureOutcome::Consumed { amount } | CaptureOutcome::Split { amount, .. } => *amount,
        }
    }
}

/// Proximity gate around a fixed point.
#[derive(Debug, Clone, Copy)]
pub struct CaptureGate {
    pub center: Vec3,
    pub radius_squared: f64,
}

impl CaptureGate {
    pub fn new(center: Vec3, radius_squared: f64) -> Self {
        Self {
            center,
            radius_squared,
        }
    }

    pub fn in_range(&self, position: Vec3) -> bool {
        position.distance_squared(self.center) <= self.radius_squared
    }

    /// Transfer up to the missing quantity from `entity` into `required`.
    ///
    /// A stack larger than what is missing is shrunk to the excess and left in
    /// the world; otherwise the entity is removed.
    pub fn capture<W: WorldAccess + ?Sized>(
        &self,
        world: &mut W,
        entity: &ItemEntityView,
        required: &mut RequiredItem,
    ) -> CaptureOutcome {
        if !self.in_range(entity.position) {
            return CaptureOutcome::OutOfRange;
        }

        let count = entity.stack.count;
        let before = required.current_amount();
        let excess = required.absorb(count);
        let amount = required.current_amount() - before;

        if excess > 0 {
            world.set_item_count(entity.id, excess);
            debug!(
                "Captured {amount}x {} from item {} ({excess} left)",
                entity.stack.item, entity.id.0
            );
            CaptureOutcome::Split {
                amount,
                remaining: excess,
            }
        } else {
            world.remove_item(entity.id);
            debug!("Captured {amount}x {} from item {}", entity.stack.item, entity.id.0);
            CaptureOutcome::Consumed { amount }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_world::GameWorld;
    use crate::item::ItemStack;

    fn setup(count: u32, at: Vec3) -> (GameWorld, ItemEntityView) {
        let mut world = GameWorld::new(1);
        let id = world.spawn_item(at, ItemStack::new("minecraft:gold_ingot", count));
        let view = world.item(id).unwrap();
        (world, view)
    }

    #[test]
    fn out_of_range_is_noop() {
        let (mut world, view) = setup(5, Vec3::new(10.0, 0.5, 0.5));
        let gate = CaptureGate::new(Vec3::new(0.5, 0.5, 0.5), 4.0);
        let mut req = RequiredItem::new("minecraft:gold_ingot", 8);
        assert_eq!(gate.capture(&mut world, &view, &mut req), CaptureOutcome::OutOfRange);
        assert_eq!(req.current_amount(), 0);
        assert_eq!(world.item(view.id).unwrap().stack.count, 5);
    }

    #[test]
    fn excess_splits_stack() {
        let (mut world, view) = setup(10, Vec3::new(1.5, 0.5, 0.5));
        let gate = CaptureGate::new(Vec3::new(0.5, 0.5, 0.5), 4.0);
        let mut req = RequiredItem::new("minecraft:gold_ingot", 8);
        req.absorb(5);

        let outcome = gate.capture(&mut world, &view, &mut req);
        assert_eq!(
            outcome,
            CaptureOutcome::Split {
                amount: 3,
                remaining: 7
            }
        );
        assert!(req.reached_amount_required());
        assert_eq!(world.item(view.id).unwrap().stack.count, 7);
    }

    #[test]
    fn small_stack_fully_consumed() {
        let (mut world, view) = setup(3, Vec3::new(0.5, 1.5, 0.5));
        let gate = CaptureGate::new(Vec3::new(0.5, 0.5, 0.5), 4.0);
        let mut req = RequiredItem::new("minecraft:gold_ingot", 8);

        let outcome = gate.capture(&mut world, &view, &mut req);
        assert_eq!(outcome, CaptureOutcome::Consumed { amount: 3 });
        assert_eq!(req.current_amount(), 3);
        assert!(world.item(view.id).is_none());
    }

    #[test]
    fn boundary_is_inclusive() {
        let gate = CaptureGate::new(Vec3::new(0.0, 0.0, 0.0), 4.0);
        assert!(gate.in_range(Vec3::new(2.0, 0.0, 0.0)));
        assert!(!gate.in_range(Vec3::new(2.01, 0.0, 0.0)));
    }
}
