//! Pulling matching loose items toward an altar.
//!
//! Each tick every item inside the scan cube that matches an unmet
//! requirement receives a fixed-size nudge toward the center. The nudge is
//! added to the item's velocity, so items accelerate over consecutive ticks
//! rather than teleporting. After the nudge the item is offered to the
//! capture gate.

use tracing::trace;

use crate::capture::{CaptureGate, CaptureOutcome};
use crate::config::TICKS_PER_SECOND;
use crate::geometry::{Aabb, Vec3};
use crate::recipe::AltarRecipe;
use crate::world_access::{ItemEntityId, WorldAccess};

/// One absorbed item, reported back to the altar.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub entity: ItemEntityId,
    pub item: String,
    pub outcome: CaptureOutcome,
}

/// Result of one attraction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttractionReport {
    /// Items that received a pull this tick.
    pub pulled: usize,
    pub captures: Vec<Capture>,
}

impl AttractionReport {
    pub fn captured_any(&self) -> bool {
        !self.captures.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttractionField {
    center: Vec3,
    radius: f64,
    /// Speed in blocks per tick.
    speed_per_tick: f64,
}

impl AttractionField {
    /// Field around `center` scanning a cube of half-width `radius`, pulling at
    /// `blocks_per_second`.
    pub fn new(center: Vec3, radius: f64, blocks_per_second: f64) -> Self {
        Self {
            center,
            radius,
            speed_per_tick: blocks_per_second / TICKS_PER_SECOND as f64,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::cube(self.center, self.radius)
    }

    /// Per-tick impulse for an item at `from`. Zero when already at the center.
    pub fn pull_vector(&self, from: Vec3) -> Vec3 {
        match (self.center - from).normalized() {
            Some(dir) => dir * self.speed_per_tick,
            None => Vec3::ZERO,
        }
    }

    /// Pull every matching item once and offer it to `gate`.
    ///
    /// An item is matched against the first unmet requirement for its item
    /// only; other requirements for the same item wait for a later tick.
    pub fn attract<W: WorldAccess + ?Sized>(
        &self,
        world: &mut W,
        recipe: &mut AltarRecipe,
        gate: &CaptureGate,
    ) -> AttractionReport {
        let mut report = AttractionReport::default();
        if recipe.is_empty() || recipe.satisfied() {
            return report;
        }

        for entity in world.items_within(&self.bounds()) {
            let Some(required) = recipe.first_unmet_match(&entity.stack) else {
                continue;
            };

            world.push_item(entity.id, self.pull_vector(entity.position));
            report.pulled += 1;

            // Re-read: the host may move items on push.
            let Some(current) = world.item(entity.id) else {
                continue;
            };
            let outcome = gate.capture(world, &current, required);
            if outcome.is_captured() {
                report.captures.push(Capture {
                    entity: current.id,
                    item: current.stack.item.clone(),
                    outcome,
                });
            }
        }

        trace!(
            "Attraction at ({:.1}, {:.1}, {:.1}): pulled {}, captured {}",
            self.center.x,
            self.center.y,
            self.center.z,
            report.pulled,
            report.captures.len()
        );
        report
    }
}
