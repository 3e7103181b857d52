//! Config loading from TOML files.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::{ConfigError, Result};
use crate::paths::resolve_config_path;

/// Parse a config from TOML text and validate it.
pub fn parse_config(text: &str, origin: &Path) -> Result<RegistryConfig> {
    let config: RegistryConfig = toml::from_str(text).map_err(|source| ConfigError::Toml {
        path: origin.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<RegistryConfig> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let config = parse_config(&text, path)?;
    info!(path = %path.display(), "loaded registry config");
    Ok(config)
}

/// Load the config named explicitly or by `REGISTRY_CONFIG`, falling back
/// to the built-in defaults.
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<RegistryConfig> {
    match resolve_config_path(explicit) {
        Some(path) => load_config(&path),
        None => {
            debug!("no config file given, using built-in defaults");
            Ok(RegistryConfig::default())
        }
    }
}

/// Render a config as TOML, e.g. to record the effective settings of a run.
pub fn render_config(config: &RegistryConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
