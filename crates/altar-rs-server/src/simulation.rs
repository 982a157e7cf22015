//! Server-side driver: owns the world, the placed altars and their observer
//! replicas, and advances them once per tick.

use std::collections::HashMap;
use std::sync::Arc;

use altar_rs_game::game_world::GameWorld;
use altar_rs_game::{
    AltarEvent, AltarFixture, AltarRecipeStore, AltarServices, BlockPos, ItemStack, Vec3,
    WorldAccess,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, trace, warn};

use crate::config::{AltarPlacement, RecipeTemplate, ServerConfig};
use crate::persistence::{SavedAltar, SavedAltars};

pub struct Simulation {
    world: GameWorld,
    services: AltarServices,
    altars: Vec<AltarFixture>,
    /// Client-side copies, updated only through `Sync` payloads.
    observers: HashMap<BlockPos, AltarFixture>,
    recipes: Vec<RecipeTemplate>,
    infusion_seconds: u32,
    rng: StdRng,
    altars_dirty: bool,
}

impl Simulation {
    pub fn new(
        config: &ServerConfig,
        store: Arc<AltarRecipeStore>,
        saved: Option<SavedAltars>,
        rng: StdRng,
    ) -> Self {
        let services = AltarServices::new(
            store,
            Arc::new(config.reward_table()),
            config.altar.clone(),
        );
        let mut sim = Self {
            world: GameWorld::new(1),
            services,
            altars: Vec::new(),
            observers: HashMap::new(),
            recipes: config.recipes.clone(),
            infusion_seconds: config.altar.infusion_seconds,
            rng,
            altars_dirty: false,
        };

        if let Some(saved) = saved {
            for entry in &saved.altars {
                let mut altar = AltarFixture::new(entry.pos, sim.services.clone());
                altar.load_record(entry.decode());
                sim.altars.push(altar);
            }
            info!("Restored {} altars", sim.altars.len());
        }

        for placement in &config.altars {
            let pos = BlockPos::new(placement.x, placement.y, placement.z);
            if sim.altars.iter().any(|a| a.pos() == pos) {
                continue;
            }
            sim.place_altar(placement);
        }

        for drop in &config.drops {
            sim.world.spawn_item(
                Vec3::new(drop.x, drop.y, drop.z),
                ItemStack::new(drop.item.clone(), drop.count),
            );
        }
        debug!("Scattered {} item drops", config.drops.len());

        sim
    }

    /// Build a fresh altar, hand its owner a recipe if they lack one and
    /// deposit the catalyst.
    fn place_altar(&mut self, placement: &AltarPlacement) {
        let pos = BlockPos::new(placement.x, placement.y, placement.z);
        let store = &self.services.store;
        if !store.has_recipe(placement.owner) {
            match self.recipes.choose(&mut self.rng) {
                Some(template) => store.set_recipe(placement.owner, template.build()),
                None => warn!("No recipe templates configured; altar at {pos:?} will idle"),
            }
        }

        let mut altar = AltarFixture::new(pos, self.services.clone());
        altar.deposit_catalyst(placement.owner);
        info!(
            "Placed altar at ({}, {}, {}) for {}",
            pos.x, pos.y, pos.z, placement.owner
        );
        self.altars.push(altar);
        self.altars_dirty = true;
    }

    /// Main game tick, called every `tick_interval_ms`.
    pub fn game_tick(&mut self) {
        self.world.tick();

        let mut events = Vec::new();
        for altar in &mut self.altars {
            if altar.begin_infusion(self.infusion_seconds) {
                self.altars_dirty = true;
            }
            events.extend(altar.tick(&mut self.world, &mut self.rng));
        }

        for event in events {
            self.handle_event(event);
        }

        for event in self.world.drain_events() {
            trace!("{event:?}");
        }
    }

    fn handle_event(&mut self, event: AltarEvent) {
        match event {
            AltarEvent::Sync { pos, payload } => {
                let replica = self
                    .observers
                    .entry(pos)
                    .or_insert_with(|| AltarFixture::new(pos, self.services.clone()));
                // Heartbeats repeat the last payload; only a change needs saving.
                if replica.encode() != payload {
                    replica.apply_encoded(&payload);
                    self.altars_dirty = true;
                }
            }
            AltarEvent::ItemCaptured {
                pos,
                item,
                amount,
                entity_removed,
            } => {
                debug!(
                    "Altar at ({}, {}, {}) captured {amount}x {item} (entity removed: {entity_removed})",
                    pos.x, pos.y, pos.z
                );
            }
            AltarEvent::InfusionCompleted { pos, reward } => match reward {
                Some(stack) => info!(
                    "Altar at ({}, {}, {}) produced {}x {}",
                    pos.x, pos.y, pos.z, stack.count, stack.item
                ),
                None => info!("Altar at ({}, {}, {}) completed with no reward", pos.x, pos.y, pos.z),
            },
            AltarEvent::CatalystEjected { pos } => {
                info!("Altar at ({}, {}, {}) ejected its catalyst", pos.x, pos.y, pos.z);
            }
        }
    }

    pub fn current_tick(&self) -> u64 {
        self.world.current_tick()
    }

    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn store(&self) -> &AltarRecipeStore {
        &self.services.store
    }

    pub fn altars(&self) -> &[AltarFixture] {
        &self.altars
    }

    pub fn observer(&self, pos: BlockPos) -> Option<&AltarFixture> {
        self.observers.get(&pos)
    }

    pub fn needs_save(&self) -> bool {
        self.altars_dirty || self.services.store.is_dirty()
    }

    /// Snapshot the placed altars for saving and clear the dirty flag.
    pub fn take_saved_altars(&mut self) -> SavedAltars {
        self.altars_dirty = false;
        SavedAltars {
            altars: self
                .altars
                .iter()
                .map(|a| SavedAltar::new(a.pos(), &a.to_record()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use uuid::Uuid;

    const OWNER: &str = "6f1c1b8e-4a55-4d44-9d7e-2a4f6bb1b001";

    fn config(extra: &str) -> ServerConfig {
        let toml_str = format!(
            r#"
            [logging]
            level = "warn"

            [altar]
            infusion_seconds = 1

            [[rewards]]
            item = "the_vault:vault_crystal_normal"

            [[recipes]]
            items = [{{ item = "minecraft:gold_ingot", amount = 4 }}]

            [[altars]]
            x = 0
            y = 4
            z = 0
            owner = "{OWNER}"

            {extra}
            "#
        );
        toml::from_str(&toml_str).unwrap()
    }

    fn owner() -> Uuid {
        Uuid::parse_str(OWNER).unwrap()
    }

    fn sim(config: &ServerConfig, saved: Option<SavedAltars>) -> Simulation {
        Simulation::new(
            config,
            Arc::new(AltarRecipeStore::new()),
            saved,
            StdRng::seed_from_u64(3),
        )
    }

    const GOLD_DROP: &str = r#"
        [[drops]]
        item = "minecraft:gold_ingot"
        count = 6
        x = 4.5
        y = 4.0
        z = 0.5
    "#;

    #[test]
    fn placement_assigns_recipe_and_catalyst() {
        let config = config("");
        let sim = sim(&config, None);
        assert_eq!(sim.altars().len(), 1);
        let altar = &sim.altars()[0];
        assert!(altar.contains_catalyst());
        assert_eq!(altar.owner(), Some(owner()));
        assert!(sim.store().has_recipe(owner()));
        assert!(sim.needs_save());
    }

    #[test]
    fn runs_to_completion_and_mirrors_observer() {
        let config = config(GOLD_DROP);
        let mut sim = sim(&config, None);
        let pos = BlockPos::new(0, 4, 0);

        let mut completed = false;
        for _ in 0..1000 {
            sim.game_tick();
            if !sim.altars()[0].contains_catalyst() {
                completed = true;
                break;
            }
        }
        assert!(completed);
        assert!(!sim.store().has_recipe(owner()));

        let items = sim.world().all_items();
        let gold: u32 = items
            .iter()
            .filter(|v| v.stack.item == "minecraft:gold_ingot")
            .map(|v| v.stack.count)
            .sum();
        assert_eq!(gold, 2);
        assert!(items
            .iter()
            .any(|v| v.stack.item == "the_vault:vault_crystal_normal"));

        let replica = sim.observer(pos).unwrap();
        assert_eq!(replica.to_record(), sim.altars()[0].to_record());
    }

    #[test]
    fn restores_saved_altars_without_reseeding() {
        let config = config("");
        let mut first = sim(&config, None);
        first.game_tick();
        let saved = first.take_saved_altars();

        let restored = sim(&config, Some(saved));
        assert_eq!(restored.altars().len(), 1);
        assert_eq!(restored.altars()[0].to_record(), first.altars()[0].to_record());
    }

    #[test]
    fn heartbeat_alone_does_not_request_save() {
        let config = config("");
        let mut sim = sim(&config, None);
        sim.game_tick();
        sim.take_saved_altars();
        sim.store().take_dirty();
        assert!(!sim.needs_save());

        // Two heartbeat intervals with nothing to pull.
        for _ in 0..40 {
            sim.game_tick();
        }
        assert!(!sim.needs_save());
        let pos = BlockPos::new(0, 4, 0);
        assert_eq!(
            sim.observer(pos).map(AltarFixture::to_record),
            Some(sim.altars()[0].to_record())
        );
    }

    #[test]
    fn state_change_requests_save() {
        let config = config(GOLD_DROP);
        let mut sim = sim(&config, None);
        sim.game_tick();
        sim.take_saved_altars();
        sim.store().take_dirty();

        for _ in 0..200 {
            sim.game_tick();
            if sim.needs_save() {
                return;
            }
        }
        panic!("captures never marked the simulation for saving");
    }

    #[test]
    fn no_templates_leaves_altar_to_eject() {
        let toml_str = format!(
            r#"
            [logging]
            level = "warn"

            [[altars]]
            x = 0
            y = 4
            z = 0
            owner = "{OWNER}"
            "#
        );
        let config: ServerConfig = toml::from_str(&toml_str).unwrap();
        let mut sim = sim(&config, None);
        assert!(!sim.store().has_recipe(owner()));

        sim.game_tick();
        assert!(!sim.altars()[0].contains_catalyst());
        assert!(sim
            .world()
            .all_items()
            .iter()
            .any(|v| v.stack.item == "the_vault:vault_rock"));
    }
}
