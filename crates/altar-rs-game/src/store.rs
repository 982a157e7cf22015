//! Per-owner recipe store.
//!
//! Recipes belong to players, not altars: several altars bound to the same
//! owner read and write the same entry. All access goes through one mutex so
//! a capture on one altar is never lost to a concurrent write from another.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AltarError;
use crate::geometry::BlockPos;
use crate::recipe::AltarRecipe;

#[derive(Default)]
pub struct AltarRecipeStore {
    recipes: Mutex<HashMap<Uuid, AltarRecipe>>,
    /// Altar currently infusing each owner's recipe. Always locked after
    /// `recipes`. Not persisted.
    claims: Mutex<HashMap<Uuid, BlockPos>>,
    dirty: AtomicBool,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    recipes: HashMap<Uuid, AltarRecipe>,
}

impl AltarRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, AltarRecipe>> {
        self.recipes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_claims(&self) -> MutexGuard<'_, HashMap<Uuid, BlockPos>> {
        self.claims.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the owner's recipe.
    pub fn recipe(&self, owner: Uuid) -> Option<AltarRecipe> {
        self.lock().get(&owner).cloned()
    }

    pub fn has_recipe(&self, owner: Uuid) -> bool {
        self.lock().contains_key(&owner)
    }

    /// Assign (or replace) the owner's recipe.
    pub fn set_recipe(&self, owner: Uuid, recipe: AltarRecipe) {
        self.lock().insert(owner, recipe);
        self.set_dirty();
    }

    /// Remove the owner's recipe and any infusion claim on it.
    pub fn remove_recipe(&self, owner: Uuid) -> Option<AltarRecipe> {
        let mut recipes = self.lock();
        let removed = recipes.remove(&owner);
        self.lock_claims().remove(&owner);
        drop(recipes);
        if removed.is_some() {
            self.set_dirty();
        }
        removed
    }

    /// Run `f` against the owner's recipe while holding the store lock.
    ///
    /// Does not mark the store dirty; callers that mutate call [`set_dirty`].
    ///
    /// [`set_dirty`]: AltarRecipeStore::set_dirty
    pub fn with_recipe_mut<T>(&self, owner: Uuid, f: impl FnOnce(&mut AltarRecipe) -> T) -> Option<T> {
        let mut guard = self.lock();
        guard.get_mut(&owner).map(f)
    }

    pub fn is_satisfied(&self, owner: Uuid) -> bool {
        self.lock()
            .get(&owner)
            .map(AltarRecipe::satisfied)
            .unwrap_or(false)
    }

    /// Reserve the owner's satisfied recipe for the altar at `pos`.
    ///
    /// Fails if the recipe is missing or incomplete, or another altar already
    /// holds the claim. Re-claiming from the same altar succeeds.
    pub fn claim_for_infusion(&self, owner: Uuid, pos: BlockPos) -> bool {
        let recipes = self.lock();
        if !recipes.get(&owner).is_some_and(AltarRecipe::satisfied) {
            return false;
        }
        let mut claims = self.lock_claims();
        match claims.get(&owner) {
            Some(&holder) if holder != pos => false,
            _ => {
                claims.insert(owner, pos);
                true
            }
        }
    }

    /// Remove the owner's recipe on behalf of the altar at `pos`. Refused
    /// while a different altar holds the claim.
    pub fn consume_for(&self, owner: Uuid, pos: BlockPos) -> Option<AltarRecipe> {
        let mut recipes = self.lock();
        let mut claims = self.lock_claims();
        if claims.get(&owner).is_some_and(|&holder| holder != pos) {
            return None;
        }
        claims.remove(&owner);
        let removed = recipes.remove(&owner);
        if removed.is_some() {
            self.set_dirty();
        }
        removed
    }

    pub fn claimed_by(&self, owner: Uuid) -> Option<BlockPos> {
        self.lock_claims().get(&owner).copied()
    }

    pub fn owners(&self) -> Vec<Uuid> {
        self.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn set_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Clear the dirty marker, returning whether it was set.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub fn to_json(&self) -> Result<String, AltarError> {
        let file = StoreFile {
            recipes: self.lock().clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AltarError> {
        let file: StoreFile = serde_json::from_str(json)?;
        Ok(Self {
            recipes: Mutex::new(file.recipes),
            claims: Mutex::default(),
            dirty: AtomicBool::new(false),
        })
    }

    /// Write the store to `path` and clear the dirty marker.
    pub fn save(&self, path: &Path) -> Result<(), AltarError> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        self.take_dirty();
        debug!("Saved altar recipes to {}", path.display());
        Ok(())
    }

    /// Load from `path`; a missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, AltarError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemStack;
    use crate::recipe::RequiredItem;

    fn recipe() -> AltarRecipe {
        AltarRecipe::new(vec![RequiredItem::new("minecraft:gold_ingot", 8)])
    }

    #[test]
    fn set_and_get() {
        let store = AltarRecipeStore::new();
        let owner = Uuid::new_v4();
        assert!(store.recipe(owner).is_none());
        store.set_recipe(owner, recipe());
        assert!(store.take_dirty());
        assert!(!store.is_dirty());
        assert_eq!(store.recipe(owner), Some(recipe()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn mutation_is_shared_between_readers() {
        let store = AltarRecipeStore::new();
        let owner = Uuid::new_v4();
        store.set_recipe(owner, recipe());

        let leftover = store.with_recipe_mut(owner, |r| {
            r.first_unmet_match(&ItemStack::new("minecraft:gold_ingot", 1))
                .map(|req| req.absorb(3))
        });
        assert_eq!(leftover, Some(Some(0)));
        let snap = store.recipe(owner).unwrap();
        assert_eq!(snap.required_items()[0].current_amount(), 3);
    }

    #[test]
    fn with_recipe_mut_missing_owner() {
        let store = AltarRecipeStore::new();
        assert!(store.with_recipe_mut(Uuid::new_v4(), |_| ()).is_none());
    }

    #[test]
    fn remove_marks_dirty_only_when_present() {
        let store = AltarRecipeStore::new();
        let owner = Uuid::new_v4();
        assert!(store.remove_recipe(owner).is_none());
        assert!(!store.is_dirty());
        store.set_recipe(owner, recipe());
        store.take_dirty();
        assert!(store.remove_recipe(owner).is_some());
        assert!(store.is_dirty());
    }

    #[test]
    fn json_roundtrip_keeps_progress() {
        let store = AltarRecipeStore::new();
        let owner = Uuid::new_v4();
        store.set_recipe(owner, recipe());
        store.with_recipe_mut(owner, |r| {
            r.first_unmet_match(&ItemStack::new("minecraft:gold_ingot", 1))
                .map(|req| req.absorb(5))
        });

        let json = store.to_json().unwrap();
        let loaded = AltarRecipeStore::from_json(&json).unwrap();
        assert!(!loaded.is_dirty());
        let r = loaded.recipe(owner).unwrap();
        assert_eq!(r.required_items()[0].current_amount(), 5);
    }

    #[test]
    fn satisfied_query() {
        let store = AltarRecipeStore::new();
        let owner = Uuid::new_v4();
        assert!(!store.is_satisfied(owner));
        store.set_recipe(owner, recipe());
        assert!(!store.is_satisfied(owner));
        store.with_recipe_mut(owner, |r| {
            r.first_unmet_match(&ItemStack::new("minecraft:gold_ingot", 8))
                .map(|req| req.absorb(8))
        });
        assert!(store.is_satisfied(owner));
    }

    #[test]
    fn claim_is_exclusive_until_recipe_removed() {
        let store = AltarRecipeStore::new();
        let owner = Uuid::new_v4();
        let a = BlockPos::new(0, 4, 0);
        let b = BlockPos::new(5, 4, 0);

        store.set_recipe(owner, recipe());
        assert!(!store.claim_for_infusion(owner, a));

        store.with_recipe_mut(owner, |r| {
            r.first_unmet_match(&ItemStack::new("minecraft:gold_ingot", 8))
                .map(|req| req.absorb(8))
        });
        assert!(store.claim_for_infusion(owner, a));
        assert!(store.claim_for_infusion(owner, a));
        assert!(!store.claim_for_infusion(owner, b));
        assert_eq!(store.claimed_by(owner), Some(a));

        assert!(store.consume_for(owner, b).is_none());
        assert!(store.has_recipe(owner));

        assert!(store.consume_for(owner, a).is_some());
        assert_eq!(store.claimed_by(owner), None);
        assert!(!store.claim_for_infusion(owner, b));
    }
}
