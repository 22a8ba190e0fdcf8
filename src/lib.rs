//! Condo-Harvest: a resilient multi-source property data collector
//!
//! This crate gathers records about residential buildings in a city from
//! several heterogeneous public sources (municipal portals, the IBGE
//! statistics API, registry offices, real-estate marketplaces), normalizes
//! them into a common record shape and writes an aggregate report.

pub mod collector;
pub mod config;
pub mod model;
pub mod output;
pub mod sources;

use thiserror::Error;

/// Main error type for Condo-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Condo-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use collector::{aggregate, Aggregate, Metadata, Orchestrator};
pub use config::Config;
pub use model::{FieldValue, Record, RecordKind, SourceResult, SourceStatus};
