//! Error types for the loading boundaries
//!
//! The simulation core never fails: rejected requests are silent no-ops.
//! Errors only exist where data enters or leaves the process:
//! - Weapon definitions (RON)
//! - Headless scenarios (JSON)
//! - Combat log export

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Ron {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("Failed to process JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown weapon: '{0}'")]
    MissingWeapon(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
