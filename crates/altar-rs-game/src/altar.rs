//! The altar fixture and its per-tick pipeline.
//!
//! A tick runs these stages in this order:
//!
//! 1. attraction and capture against the owner's recipe in the store
//! 2. infusion timer step
//! 3. completion, if the timer reached zero
//! 4. refresh of the local recipe snapshot from the store
//! 5. abandonment: catalyst present, no recipe, not infusing
//! 6. periodic sync heartbeat
//!
//! Capture writes straight into the store. The local `recipe` snapshot is only
//! refreshed in stage 4, so during stages 1-3 it reflects the previous tick.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::attraction::AttractionField;
use crate::capture::{CaptureGate, CaptureOutcome};
use crate::config::AltarConfig;
use crate::geometry::{BlockPos, Vec3};
use crate::infusion::{InfusionTimer, TimerStep};
use crate::item::ItemStack;
use crate::recipe::AltarRecipe;
use crate::record::AltarRecord;
use crate::reward::RewardTable;
use crate::store::AltarRecipeStore;
use crate::world_access::WorldAccess;

/// Where ejected catalysts and rewards appear, relative to the block corner.
pub const OUTPUT_OFFSET: (f64, f64, f64) = (0.5, 1.5, 0.5);

/// Shared collaborators injected into every altar.
#[derive(Clone)]
pub struct AltarServices {
    pub store: Arc<AltarRecipeStore>,
    pub rewards: Arc<RewardTable>,
    pub config: Arc<AltarConfig>,
}

impl AltarServices {
    pub fn new(store: Arc<AltarRecipeStore>, rewards: Arc<RewardTable>, config: AltarConfig) -> Self {
        Self {
            store,
            rewards,
            config: Arc::new(config),
        }
    }
}

/// Things that happened during a tick, for the driver to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum AltarEvent {
    /// Observers should apply `payload` with [`AltarFixture::apply_encoded`].
    Sync { pos: BlockPos, payload: String },
    ItemCaptured {
        pos: BlockPos,
        item: String,
        amount: u32,
        entity_removed: bool,
    },
    InfusionCompleted {
        pos: BlockPos,
        reward: Option<ItemStack>,
    },
    CatalystEjected { pos: BlockPos },
}

pub struct AltarFixture {
    pos: BlockPos,
    services: AltarServices,
    owner: Option<Uuid>,
    recipe: Option<AltarRecipe>,
    contains_catalyst: bool,
    infusion: InfusionTimer,
    sync_pending: bool,
}

impl AltarFixture {
    pub fn new(pos: BlockPos, services: AltarServices) -> Self {
        Self {
            pos,
            services,
            owner: None,
            recipe: None,
            contains_catalyst: false,
            infusion: InfusionTimer::Idle,
            sync_pending: false,
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: Uuid) {
        self.owner = Some(owner);
    }

    /// Local recipe snapshot (at most one tick behind the store).
    pub fn recipe(&self) -> Option<&AltarRecipe> {
        self.recipe.as_ref()
    }

    pub fn contains_catalyst(&self) -> bool {
        self.contains_catalyst
    }

    pub fn set_contains_catalyst(&mut self, contains_catalyst: bool) {
        self.contains_catalyst = contains_catalyst;
    }

    pub fn infusion(&self) -> InfusionTimer {
        self.infusion
    }

    /// Remaining infusion ticks, `-1` when idle.
    pub fn infusion_timer(&self) -> i64 {
        self.infusion.as_ticks()
    }

    pub fn is_infusing(&self) -> bool {
        self.infusion.is_infusing()
    }

    pub fn start_infusion_timer(&mut self, seconds: u32) {
        self.infusion.start(seconds);
    }

    /// Resume or pause the countdown. Returns `false` if no infusion was started.
    pub fn set_infusing(&mut self, infusing: bool) -> bool {
        self.infusion.set_infusing(infusing)
    }

    /// Start a full infusion if the owner's recipe is complete and no other
    /// altar of the same owner is already infusing it.
    pub fn begin_infusion(&mut self, seconds: u32) -> bool {
        let Some(owner) = self.owner else {
            return false;
        };
        if !self.contains_catalyst
            || !self.infusion.is_idle()
            || !self.services.store.claim_for_infusion(owner, self.pos)
        {
            return false;
        }

        self.infusion.start(seconds);
        self.infusion.set_infusing(true);
        self.send_updates();
        info!(
            "Altar at ({}, {}, {}) infusing for {seconds}s",
            self.pos.x, self.pos.y, self.pos.z
        );
        true
    }

    /// Place the catalyst and bind the altar to `owner`.
    pub fn deposit_catalyst(&mut self, owner: Uuid) -> bool {
        if self.contains_catalyst {
            return false;
        }
        self.owner = Some(owner);
        self.contains_catalyst = true;
        self.refresh_recipe();
        self.send_updates();
        true
    }

    /// Take the catalyst back out. Refused while a recipe is active or the
    /// altar is infusing.
    pub fn take_catalyst(&mut self) -> Option<ItemStack> {
        if !self.contains_catalyst || self.infusion.is_infusing() {
            return None;
        }
        if self.owner.is_some_and(|o| self.services.store.has_recipe(o)) {
            return None;
        }
        self.contains_catalyst = false;
        self.send_updates();
        Some(self.catalyst_stack())
    }

    /// Whether a direct deposit of `stack` could ever be accepted.
    pub fn is_item_valid(&self, stack: &ItemStack) -> bool {
        self.recipe
            .as_ref()
            .is_some_and(|r| r.required_items().iter().any(|req| req.is_item_equal(stack)))
    }

    /// Deposit a stack directly (e.g. from a hopper). Returns what was not
    /// accepted. With `simulate` nothing is changed.
    pub fn insert_stack(&mut self, stack: ItemStack, simulate: bool) -> ItemStack {
        if stack.is_empty() {
            return stack;
        }
        let Some(owner) = self.owner else {
            return stack;
        };

        let excess = self
            .services
            .store
            .with_recipe_mut(owner, |recipe| {
                let required = recipe.first_unmet_match(&stack)?;
                Some(if simulate {
                    required.excess(stack.count)
                } else {
                    required.absorb(stack.count)
                })
            })
            .flatten();

        let Some(excess) = excess else {
            return stack;
        };
        if !simulate {
            self.services.store.set_dirty();
            self.refresh_recipe();
            self.send_updates();
        }
        stack.with_count(excess)
    }

    /// Advance the altar by one scheduler tick.
    pub fn tick<W, R>(&mut self, world: &mut W, rng: &mut R) -> Vec<AltarEvent>
    where
        W: WorldAccess + ?Sized,
        R: Rng + ?Sized,
    {
        let mut events = Vec::new();
        if !world.is_authoritative() || !self.contains_catalyst {
            return events;
        }

        self.pull_nearby_items(world, &mut events);

        if self.infusion.tick() == TimerStep::Completed {
            self.complete_infusion(world, rng, &mut events);
            self.send_updates();
        }

        self.refresh_recipe();

        if self.contains_catalyst && self.recipe.is_none() && !self.infusion.is_infusing() {
            self.eject_catalyst(world, &mut events);
        }

        let interval = self.services.config.sync_interval_ticks;
        if interval > 0 && world.game_time() % interval == 0 {
            self.send_updates();
        }

        events.extend(self.flush_sync());
        events
    }

    /// Emit the pending sync request, if any.
    pub fn flush_sync(&mut self) -> Option<AltarEvent> {
        if !std::mem::take(&mut self.sync_pending) {
            return None;
        }
        Some(AltarEvent::Sync {
            pos: self.pos,
            payload: self.encode(),
        })
    }

    /// Request a sync to observers at the end of the current tick.
    pub fn send_updates(&mut self) {
        self.sync_pending = true;
    }

    pub fn output_position(&self) -> Vec3 {
        self.pos
            .offset(OUTPUT_OFFSET.0, OUTPUT_OFFSET.1, OUTPUT_OFFSET.2)
    }

    // -----------------------------------------------------------------------
    // Persistence / sync
    // -----------------------------------------------------------------------

    pub fn to_record(&self) -> AltarRecord {
        AltarRecord {
            contains_catalyst: self.contains_catalyst,
            owner: self.owner,
            recipe: self.recipe.clone(),
            infusion: self.infusion,
        }
    }

    pub fn load_record(&mut self, record: AltarRecord) {
        self.contains_catalyst = record.contains_catalyst;
        self.owner = record.owner;
        self.recipe = record.recipe;
        self.infusion = record.infusion;
    }

    pub fn encode(&self) -> String {
        self.to_record().encode()
    }

    /// Apply a payload produced by [`encode`](Self::encode) or a `Sync` event.
    pub fn apply_encoded(&mut self, payload: &str) {
        self.load_record(AltarRecord::decode(payload));
    }

    // -----------------------------------------------------------------------
    // Pipeline stages
    // -----------------------------------------------------------------------

    fn pull_nearby_items<W: WorldAccess + ?Sized>(
        &mut self,
        world: &mut W,
        events: &mut Vec<AltarEvent>,
    ) {
        let Some(owner) = self.owner else {
            return;
        };

        let center = self.pos.center();
        let config = &self.services.config;
        let field = AttractionField::new(center, config.item_range_check, config.pull_speed);
        let gate = CaptureGate::new(center, config.capture_radius_squared());

        let Some(report) = self
            .services
            .store
            .with_recipe_mut(owner, |recipe| field.attract(world, recipe, &gate))
        else {
            return;
        };
        if !report.captured_any() {
            return;
        }

        self.services.store.set_dirty();
        for capture in report.captures {
            events.push(AltarEvent::ItemCaptured {
                pos: self.pos,
                item: capture.item,
                amount: capture.outcome.amount(),
                entity_removed: matches!(capture.outcome, CaptureOutcome::Consumed { .. }),
            });
        }
        self.send_updates();
    }

    fn complete_infusion<W, R>(&mut self, world: &mut W, rng: &mut R, events: &mut Vec<AltarEvent>)
    where
        W: WorldAccess + ?Sized,
        R: Rng + ?Sized,
    {
        self.infusion.reset();
        self.recipe = None;
        let consumed = self
            .owner
            .and_then(|o| self.services.store.consume_for(o, self.pos))
            .is_some();
        if !consumed {
            // Materials used or held by another altar; keep the catalyst so
            // the abandonment stage hands it back.
            warn!(
                "Altar at ({}, {}, {}) finished infusion without a recipe; no reward",
                self.pos.x, self.pos.y, self.pos.z
            );
            return;
        }
        self.contains_catalyst = false;

        let reward = self.services.rewards.roll(rng);
        match &reward {
            Some(stack) => {
                world.spawn_item(self.output_position(), stack.clone());
                info!(
                    "Altar at ({}, {}, {}) finished infusion: {}x {}",
                    self.pos.x, self.pos.y, self.pos.z, stack.count, stack.item
                );
            }
            None => warn!(
                "Altar at ({}, {}, {}) finished infusion but the reward table is empty",
                self.pos.x, self.pos.y, self.pos.z
            ),
        }

        events.push(AltarEvent::InfusionCompleted {
            pos: self.pos,
            reward,
        });
    }

    fn refresh_recipe(&mut self) {
        self.recipe = self.owner.and_then(|o| self.services.store.recipe(o));
    }

    fn eject_catalyst<W: WorldAccess + ?Sized>(&mut self, world: &mut W, events: &mut Vec<AltarEvent>) {
        self.contains_catalyst = false;
        world.spawn_item(self.output_position(), self.catalyst_stack());
        debug!(
            "Altar at ({}, {}, {}) has no recipe; ejected catalyst",
            self.pos.x, self.pos.y, self.pos.z
        );
        events.push(AltarEvent::CatalystEjected { pos: self.pos });
        self.send_updates();
    }

    fn catalyst_stack(&self) -> ItemStack {
        ItemStack::new(self.services.config.catalyst_item.clone(), 1)
    }
}
