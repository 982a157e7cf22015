//! Errors raised at the persistence boundary.
//!
//! The tick itself never fails; these only surface when reading or writing
//! saved state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AltarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid altar config: {0}")]
    InvalidConfig(String),
}
