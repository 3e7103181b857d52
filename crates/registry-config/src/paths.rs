//! Config file path resolution.

use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "REGISTRY_CONFIG";

/// Resolve the config file to load.
///
/// Resolution order:
/// 1. explicit path (e.g. `--config`)
/// 2. `REGISTRY_CONFIG` environment variable
/// 3. none, meaning built-in defaults
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    std::env::var_os(CONFIG_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
