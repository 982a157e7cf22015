//! Altar persistence and sync record.
//!
//! The same record is written to disk and pushed to observers, and both read
//! it back through [`AltarRecord::decode`]. Decoding never fails: a missing or
//! malformed field falls back to its inactive default and the rest of the
//! record is kept.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::error::AltarError;
use crate::infusion::InfusionTimer;
use crate::recipe::AltarRecipe;

const CONTAINS_CATALYST: &str = "contains_catalyst";
const OWNER: &str = "owner";
const RECIPE: &str = "recipe";
const INFUSION: &str = "infusion";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AltarRecord {
    #[serde(default)]
    pub contains_catalyst: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<AltarRecipe>,
    #[serde(default)]
    pub infusion: InfusionTimer,
}

impl AltarRecord {
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(CONTAINS_CATALYST.into(), Value::Bool(self.contains_catalyst));
        if let Some(owner) = self.owner {
            map.insert(OWNER.into(), Value::String(owner.to_string()));
        }
        if let Some(recipe) = &self.recipe {
            if let Ok(v) = serde_json::to_value(recipe) {
                map.insert(RECIPE.into(), v);
            }
        }
        if let Ok(v) = serde_json::to_value(self.infusion) {
            map.insert(INFUSION.into(), v);
        }
        Value::Object(map)
    }

    pub fn encode(&self) -> String {
        self.to_value().to_string()
    }

    /// Field-by-field decode with defaults for anything missing or malformed.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            warn!("Altar record is not an object; using defaults");
            return Self::default();
        };

        Self {
            contains_catalyst: map
                .get(CONTAINS_CATALYST)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            owner: field(map, OWNER),
            recipe: field(map, RECIPE),
            infusion: field(map, INFUSION).unwrap_or_default(),
        }
    }

    /// Decode an encoded record. Unparseable input yields the default record.
    pub fn decode(data: &str) -> Self {
        match serde_json::from_str::<Value>(data) {
            Ok(v) => Self::from_value(&v),
            Err(e) => {
                warn!("Unreadable altar record ({e}); using defaults");
                Self::default()
            }
        }
    }

    /// Strict decode for tooling that wants to see errors.
    pub fn decode_strict(data: &str) -> Result<Self, AltarError> {
        Ok(serde_json::from_str(data)?)
    }
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    let v = map.get(key)?;
    if v.is_null() {
        return None;
    }
    match serde_json::from_value(v.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Ignoring malformed altar field `{key}`: {e}");
            None
        }
    }
}
