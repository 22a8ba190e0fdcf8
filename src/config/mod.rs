//! Configuration module for Condo-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: [`Config::default`] describes the built-in
//! Maceió source set.
//!
//! # Example
//!
//! ```no_run
//! use condo_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Collecting data for {}", config.collector.city);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_portals, CollectorConfig, Config, LoggingConfig, MarketplaceConfig, MarketplaceSite,
    OutputConfig, PortalConfig, RegistryConfig, RegistryOffice, StatisticsConfig,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
