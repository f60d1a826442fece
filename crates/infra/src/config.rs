//! Configuration loading.
//!
//! Reads an [`EngineConfig`] from a TOML file, then applies environment
//! overrides. Every field has a default, so a missing file yields a
//! fully usable configuration.
//!
//! Recognised environment variables:
//! - `COVERAGEIQ_DB_PATH` - database file path
//! - `COVERAGEIQ_DB_POOL_SIZE` - connection pool size
//! - `COVERAGEIQ_TICK_INTERVAL` - reconciler tick interval in seconds
//! - `COVERAGEIQ_TIMEZONE` - IANA timezone for the working window

use std::path::Path;

use coverageiq_domain::{CoverageError, EngineConfig, Result};
use tracing::{debug, info};

const DEFAULT_CONFIG_FILES: &[&str] = &["coverageiq.toml", "config.toml"];

/// Loads configuration from `path`, or from the first default config file
/// found in the working directory when `path` is `None`.
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => {
            let found = DEFAULT_CONFIG_FILES
                .iter()
                .map(Path::new)
                .find(|p| p.exists());
            match found {
                Some(path) => read_file(path)?,
                None => {
                    debug!("no config file found, using defaults");
                    EngineConfig::default()
                }
            }
        }
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<EngineConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        CoverageError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let config = toml::from_str(&raw).map_err(|e| {
        CoverageError::Config(format!("failed to parse {}: {e}", path.display()))
    })?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn apply_env_overrides(config: &mut EngineConfig) -> Result<()> {
    if let Ok(path) = std::env::var("COVERAGEIQ_DB_PATH") {
        config.database.path = path;
    }
    if let Ok(size) = std::env::var("COVERAGEIQ_DB_POOL_SIZE") {
        config.database.pool_size = size.parse().map_err(|_| {
            CoverageError::Config(format!("COVERAGEIQ_DB_POOL_SIZE must be a number, got {size:?}"))
        })?;
    }
    if let Ok(interval) = std::env::var("COVERAGEIQ_TICK_INTERVAL") {
        config.reconciler.tick_interval_seconds = interval.parse().map_err(|_| {
            CoverageError::Config(format!(
                "COVERAGEIQ_TICK_INTERVAL must be a number of seconds, got {interval:?}"
            ))
        })?;
    }
    if let Ok(timezone) = std::env::var("COVERAGEIQ_TIMEZONE") {
        config.working_hours.timezone = timezone;
    }
    Ok(())
}
