//! Configuration for the registry survival pipeline.
//!
//! Every key is optional; the defaults reproduce the registry's standard
//! analysis (adult malignant tumors diagnosed 2011-2019, observation window
//! closing 2019-12-31).

pub mod config;
pub mod error;
pub mod loader;
pub mod paths;

pub use config::{CohortConfig, LinkageConfig, RegistryConfig, SurvivalConfig, TumorGroupConfig};
pub use error::{ConfigError, Result};
pub use loader::{load_config, load_config_or_default, parse_config, render_config};
pub use paths::{CONFIG_ENV_VAR, resolve_config_path};
