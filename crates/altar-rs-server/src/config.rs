use altar_rs_game::reward::{RewardEntry, RewardTable};
use altar_rs_game::{AltarConfig, AltarRecipe, RequiredItem};
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub world: WorldSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub altar: AltarConfig,
    #[serde(default)]
    pub rewards: Vec<RewardEntry>,
    #[serde(default)]
    pub recipes: Vec<RecipeTemplate>,
    #[serde(default)]
    pub altars: Vec<AltarPlacement>,
    #[serde(default)]
    pub drops: Vec<DropSpawn>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Milliseconds between ticks. Default: 50 (20 ticks per second).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Stop after this many ticks. 0 = run until interrupted.
    #[serde(default)]
    pub max_ticks: u64,
}

fn default_tick_interval_ms() -> u64 {
    50
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Auto-save interval in seconds. 0 = disabled. Default: 300 (5 minutes).
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval: u64,
}

fn default_data_dir() -> String {
    "altar-data".into()
}

fn default_auto_save_interval() -> u64 {
    300
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            auto_save_interval: default_auto_save_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

/// A recipe handed to an owner when they place a catalyst.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeTemplate {
    pub items: Vec<RequirementTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequirementTemplate {
    pub item: String,
    pub amount: u32,
}

impl RecipeTemplate {
    pub fn build(&self) -> AltarRecipe {
        AltarRecipe::new(
            self.items
                .iter()
                .map(|r| RequiredItem::new(r.item.clone(), r.amount))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AltarPlacement {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub owner: Uuid,
}

/// A loose item scattered into the world at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct DropSpawn {
    pub item: String,
    pub count: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.altar.validate()?;
        Ok(config)
    }

    /// Configured rewards, or the vault crystal table when none are given.
    pub fn reward_table(&self) -> RewardTable {
        if self.rewards.is_empty() {
            RewardTable::vault_crystals()
        } else {
            RewardTable::new(self.rewards.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml_str = r#"
            [logging]
            level = "debug"
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.tick_interval_ms, 50);
        assert_eq!(config.server.max_ticks, 0);
        assert_eq!(config.world.data_dir, "altar-data");
        assert_eq!(config.world.auto_save_interval, 300);
        // altar section defaults when absent
        assert_eq!(config.altar.item_range_check, 8.0);
        assert_eq!(config.altar.catalyst_item, "the_vault:vault_rock");
        assert!(config.recipes.is_empty());
        assert!(config.altars.is_empty());
        assert_eq!(config.reward_table().total_weight(), 100);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            [server]
            tick_interval_ms = 10
            max_ticks = 600

            [world]
            data_dir = "/tmp/altars"
            auto_save_interval = 0

            [logging]
            level = "info"

            [altar]
            pull_speed = 2.0
            infusion_seconds = 3

            [[rewards]]
            item = "minecraft:diamond"
            count = 2
            weight = 5

            [[recipes]]
            items = [
                { item = "minecraft:gold_ingot", amount = 8 },
                { item = "minecraft:diamond", amount = 2 },
            ]

            [[altars]]
            x = 0
            y = 4
            z = 0
            owner = "6f1c1b8e-4a55-4d44-9d7e-2a4f6bb1b001"

            [[drops]]
            item = "minecraft:gold_ingot"
            count = 16
            x = 5.0
            y = 4.0
            z = 0.5
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.tick_interval_ms, 10);
        assert_eq!(config.server.max_ticks, 600);
        assert_eq!(config.world.data_dir, "/tmp/altars");
        assert_eq!(config.altar.pull_speed, 2.0);
        assert_eq!(config.altar.infusion_seconds, 3);
        assert_eq!(config.altar.capture_radius, 2.0);

        let table = config.reward_table();
        assert_eq!(table.entries().len(), 1);
        assert_eq!(table.entries()[0].count, 2);

        let recipe = config.recipes[0].build();
        assert_eq!(recipe.required_items().len(), 2);
        assert_eq!(recipe.required_items()[1].amount_required(), 2);

        assert_eq!(config.altars[0].y, 4);
        assert_eq!(
            config.altars[0].owner,
            Uuid::parse_str("6f1c1b8e-4a55-4d44-9d7e-2a4f6bb1b001").unwrap()
        );
        assert_eq!(config.drops[0].count, 16);
    }

    #[test]
    fn missing_logging_section_is_error() {
        assert!(toml::from_str::<ServerConfig>("[server]\nmax_ticks = 1\n").is_err());
    }
}
