//! Tunables for altar behavior.

use serde::Deserialize;

use crate::error::AltarError;

/// Scheduler rate; all tick-based durations are derived from it.
pub const TICKS_PER_SECOND: u32 = 20;

/// Altar settings, usually read from the `[altar]` section of `server.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AltarConfig {
    /// Half-width of the cube scanned for loose items, in blocks.
    #[serde(default = "default_item_range_check")]
    pub item_range_check: f64,
    /// Pull speed in blocks per second.
    #[serde(default = "default_pull_speed")]
    pub pull_speed: f64,
    /// Distance from the altar center at which items are absorbed.
    #[serde(default = "default_capture_radius")]
    pub capture_radius: f64,
    /// Forced sync interval in ticks. 0 = no heartbeat.
    #[serde(default = "default_sync_interval_ticks")]
    pub sync_interval_ticks: u64,
    /// Item that activates the altar and is ejected when a run is abandoned.
    #[serde(default = "default_catalyst_item")]
    pub catalyst_item: String,
    /// Infusion length used by drivers that start infusions automatically.
    #[serde(default = "default_infusion_seconds")]
    pub infusion_seconds: u32,
}

fn default_item_range_check() -> f64 {
    8.0
}

fn default_pull_speed() -> f64 {
    1.0
}

fn default_capture_radius() -> f64 {
    2.0
}

fn default_sync_interval_ticks() -> u64 {
    20
}

fn default_catalyst_item() -> String {
    "the_vault:vault_rock".into()
}

fn default_infusion_seconds() -> u32 {
    5
}

impl Default for AltarConfig {
    fn default() -> Self {
        Self {
            item_range_check: default_item_range_check(),
            pull_speed: default_pull_speed(),
            capture_radius: default_capture_radius(),
            sync_interval_ticks: default_sync_interval_ticks(),
            catalyst_item: default_catalyst_item(),
            infusion_seconds: default_infusion_seconds(),
        }
    }
}

impl AltarConfig {
    pub fn capture_radius_squared(&self) -> f64 {
        self.capture_radius * self.capture_radius
    }

    /// Reject values that would make the altar misbehave silently.
    pub fn validate(&self) -> Result<(), AltarError> {
        if !(self.item_range_check.is_finite() && self.item_range_check > 0.0) {
            return Err(AltarError::InvalidConfig(format!(
                "item_range_check must be positive, got {}",
                self.item_range_check
            )));
        }
        if !(self.pull_speed.is_finite() && self.pull_speed >= 0.0) {
            return Err(AltarError::InvalidConfig(format!(
                "pull_speed must be non-negative, got {}",
                self.pull_speed
            )));
        }
        if !(self.capture_radius.is_finite() && self.capture_radius >= 0.0) {
            return Err(AltarError::InvalidConfig(format!(
                "capture_radius must be non-negative, got {}",
                self.capture_radius
            )));
        }
        if self.catalyst_item.is_empty() {
            return Err(AltarError::InvalidConfig(
                "catalyst_item must not be empty".into(),
            ));
        }
        Ok(())
    }
}
