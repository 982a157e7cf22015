use std::path::{Path, PathBuf};

use altar_rs_game::record::AltarRecord;
use altar_rs_game::{AltarError, AltarRecipeStore, BlockPos};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub const RECIPES_FILE: &str = "altar_recipes.json";
pub const ALTARS_FILE: &str = "altars.json";

/// One placed altar as written to `altars.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAltar {
    pub pos: BlockPos,
    /// Raw record; decoded leniently so one bad field doesn't drop the altar.
    pub record: Value,
}

impl SavedAltar {
    pub fn new(pos: BlockPos, record: &AltarRecord) -> Self {
        Self {
            pos,
            record: record.to_value(),
        }
    }

    pub fn decode(&self) -> AltarRecord {
        AltarRecord::from_value(&self.record)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedAltars {
    #[serde(default)]
    pub altars: Vec<SavedAltar>,
}

/// The server's data directory: recipe store plus placed altars.
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    fn recipes_path(&self) -> PathBuf {
        self.root.join(RECIPES_FILE)
    }

    fn altars_path(&self) -> PathBuf {
        self.root.join(ALTARS_FILE)
    }

    pub fn load_store(&self) -> Result<AltarRecipeStore, AltarError> {
        AltarRecipeStore::load(&self.recipes_path())
    }

    pub fn save_store(&self, store: &AltarRecipeStore) -> Result<(), AltarError> {
        let path = self.recipes_path();
        backup(&path);
        store.save(&path)
    }

    /// Load placed altars. `Ok(None)` means nothing has been saved yet.
    pub fn load_altars(&self) -> Result<Option<SavedAltars>, AltarError> {
        let path = self.altars_path();
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        let saved: SavedAltars = serde_json::from_str(&data)?;
        debug!("Loaded {} altars from {}", saved.altars.len(), path.display());
        Ok(Some(saved))
    }

    pub fn save_altars(&self, saved: &SavedAltars) -> Result<(), AltarError> {
        let path = self.altars_path();
        backup(&path);
        let json = serde_json::to_string_pretty(saved)?;
        std::fs::write(&path, json)?;
        debug!("Saved {} altars to {}", saved.altars.len(), path.display());
        Ok(())
    }
}

fn backup(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::copy(path, path.with_extension("json_old")) {
            warn!("Failed to back up {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altar_rs_game::infusion::InfusionTimer;
    use altar_rs_game::{AltarRecipe, RequiredItem};
    use uuid::Uuid;

    fn temp_dir() -> DataDir {
        let dir = std::env::temp_dir().join(format!("altar_rs_persist_{}", rand::random::<u64>()));
        let data = DataDir::new(dir);
        data.ensure().unwrap();
        data
    }

    fn recipe() -> AltarRecipe {
        AltarRecipe::new(vec![RequiredItem::new("minecraft:gold_ingot", 8)])
    }

    #[test]
    fn empty_dir_loads_nothing() {
        let data = temp_dir();
        assert!(data.load_altars().unwrap().is_none());
        assert!(data.load_store().unwrap().is_empty());
        std::fs::remove_dir_all(data.root()).ok();
    }

    #[test]
    fn altars_roundtrip() {
        let data = temp_dir();
        let owner = Uuid::new_v4();
        let mut timer = InfusionTimer::default();
        timer.start(3);
        let record = AltarRecord {
            contains_catalyst: true,
            owner: Some(owner),
            recipe: Some(recipe()),
            infusion: timer,
        };
        let saved = SavedAltars {
            altars: vec![SavedAltar::new(BlockPos::new(1, 4, -2), &record)],
        };
        data.save_altars(&saved).unwrap();

        let loaded = data.load_altars().unwrap().unwrap();
        assert_eq!(loaded.altars.len(), 1);
        assert_eq!(loaded.altars[0].pos, BlockPos::new(1, 4, -2));
        assert_eq!(loaded.altars[0].decode(), record);

        std::fs::remove_dir_all(data.root()).ok();
    }

    #[test]
    fn store_roundtrip_clears_dirty() {
        let data = temp_dir();
        let owner = Uuid::new_v4();
        let store = AltarRecipeStore::new();
        store.set_recipe(owner, recipe());
        assert!(store.is_dirty());

        data.save_store(&store).unwrap();
        assert!(!store.is_dirty());

        let loaded = data.load_store().unwrap();
        assert_eq!(loaded.recipe(owner), Some(recipe()));

        std::fs::remove_dir_all(data.root()).ok();
    }

    #[test]
    fn second_save_creates_backup() {
        let data = temp_dir();
        let saved = SavedAltars::default();
        data.save_altars(&saved).unwrap();
        data.save_altars(&saved).unwrap();
        assert!(data.root().join("altars.json_old").exists());
        std::fs::remove_dir_all(data.root()).ok();
    }

    #[test]
    fn malformed_record_field_keeps_altar() {
        let data = temp_dir();
        let json = r#"{"altars":[{"pos":{"x":0,"y":4,"z":0},"record":{"contains_catalyst":true,"infusion":"bogus"}}]}"#;
        std::fs::write(data.root().join(ALTARS_FILE), json).unwrap();

        let loaded = data.load_altars().unwrap().unwrap();
        let record = loaded.altars[0].decode();
        assert!(record.contains_catalyst);
        assert!(record.infusion.is_idle());

        std::fs::remove_dir_all(data.root()).ok();
    }
}
