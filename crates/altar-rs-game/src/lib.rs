//! Altar logic: item attraction, requirement accumulation, and timed infusion.

pub mod altar;
pub mod attraction;
pub mod capture;
pub mod components;
pub mod config;
pub mod error;
pub mod game_world;
pub mod geometry;
pub mod infusion;
pub mod item;
pub mod recipe;
pub mod record;
pub mod reward;
pub mod store;
pub mod world_access;

pub use altar::{AltarEvent, AltarFixture, AltarServices};
pub use config::{AltarConfig, TICKS_PER_SECOND};
pub use error::AltarError;
pub use geometry::{Aabb, BlockPos, Vec3};
pub use item::ItemStack;
pub use recipe::{AltarRecipe, RequiredItem};
pub use store::AltarRecipeStore;
pub use world_access::{ItemEntityId, ItemEntityView, WorldAccess};
