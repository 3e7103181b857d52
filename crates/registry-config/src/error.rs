#![deny(unsafe_code)]

use std::path::PathBuf;

use registry_model::CodeError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid year range: start {start} is after end {end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("tumor group #{index} has an empty name")]
    EmptyGroupName { index: usize },

    #[error("duplicate tumor group name: {name}")]
    DuplicateGroupName { name: String },

    #[error("tumor group '{name}' differs from '{existing}' only in case or punctuation")]
    AmbiguousGroupName { name: String, existing: String },

    #[error("tumor group name '{name}' is reserved for unmatched site codes")]
    ReservedGroupName { name: String },

    #[error("invalid code in {field}: {source}")]
    InvalidCode {
        field: String,
        #[source]
        source: CodeError,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
