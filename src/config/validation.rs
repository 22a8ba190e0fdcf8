use crate::config::types::{
    CollectorConfig, Config, MarketplaceConfig, PortalConfig, RegistryConfig, StatisticsConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_collector_config(&config.collector)?;
    validate_output_directory(&config.output.directory)?;
    validate_portals(&config.portals)?;
    validate_statistics(&config.statistics)?;
    validate_registry(&config.registry)?;
    validate_marketplace(&config.marketplace)?;
    validate_unique_ids(config)?;
    Ok(())
}

/// Validates collector configuration
fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    if config.city.trim().is_empty() {
        return Err(ConfigError::Validation("city cannot be empty".to_string()));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    validate_timeout("default_timeout_secs", Some(config.default_timeout_secs))?;

    if config.max_parallel_sources < 1 || config.max_parallel_sources > 16 {
        return Err(ConfigError::Validation(format!(
            "max_parallel_sources must be between 1 and 16, got {}",
            config.max_parallel_sources
        )));
    }

    Ok(())
}

fn validate_output_directory(directory: &str) -> Result<(), ConfigError> {
    if directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates portal entries
fn validate_portals(portals: &[PortalConfig]) -> Result<(), ConfigError> {
    for portal in portals {
        validate_source_id(&portal.id)?;
        validate_http_url(&portal.id, &portal.url)?;
        validate_timeout(&portal.id, portal.timeout_secs)?;

        if portal.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "Portal '{}' must have at least one keyword",
                portal.id
            )));
        }
    }

    Ok(())
}

fn validate_statistics(config: &StatisticsConfig) -> Result<(), ConfigError> {
    validate_source_id(&config.id)?;
    validate_http_url(&config.id, &config.base_url)?;
    validate_timeout(&config.id, config.timeout_secs)?;

    if config.period.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "Source '{}' must name a period",
            config.id
        )));
    }

    Ok(())
}

fn validate_registry(config: &RegistryConfig) -> Result<(), ConfigError> {
    validate_source_id(&config.id)?;
    validate_timeout(&config.id, config.timeout_secs)?;

    if let Some(index_url) = &config.index_url {
        validate_http_url(&config.id, index_url)?;
    }

    for office in &config.offices {
        if office.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Source '{}' lists an office without a name",
                config.id
            )));
        }
    }

    Ok(())
}

fn validate_marketplace(config: &MarketplaceConfig) -> Result<(), ConfigError> {
    validate_source_id(&config.id)?;
    validate_timeout(&config.id, config.timeout_secs)?;

    if config.max_containers < 1 {
        return Err(ConfigError::Validation(format!(
            "max_containers must be >= 1, got {}",
            config.max_containers
        )));
    }

    Selector::parse(&config.container_selector).map_err(|e| {
        ConfigError::Validation(format!(
            "Invalid container selector '{}': {:?}",
            config.container_selector, e
        ))
    })?;

    for site in &config.sites {
        validate_http_url(&config.id, &site.url)?;
    }

    Ok(())
}

/// Source ids name output files, so they are restricted to a safe alphabet
fn validate_source_id(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() {
        return Err(ConfigError::Validation(
            "source id cannot be empty".to_string(),
        ));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "source id must contain only lowercase letters, digits, '_' and '-', got '{}'",
            id
        )));
    }

    Ok(())
}

fn validate_unique_ids(config: &Config) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    let ids = config
        .portals
        .iter()
        .map(|p| p.id.as_str())
        .chain([
            config.statistics.id.as_str(),
            config.registry.id.as_str(),
            config.marketplace.id.as_str(),
        ]);

    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id '{}'",
                id
            )));
        }
    }

    Ok(())
}

fn validate_http_url(owner: &str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}' in '{}': {}", raw, owner, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' in '{}' must use http or https",
            raw, owner
        )));
    }

    Ok(())
}

fn validate_timeout(owner: &str, timeout_secs: Option<u64>) -> Result<(), ConfigError> {
    match timeout_secs {
        Some(secs) if !(1..=120).contains(&secs) => Err(ConfigError::Validation(format!(
            "timeout for '{}' must be between 1 and 120 seconds, got {}",
            owner, secs
        ))),
        _ => Ok(()),
    }
}
