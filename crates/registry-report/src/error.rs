//! Error types for curve estimation and report output.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the product-limit estimator.
#[derive(Debug, Error, PartialEq)]
pub enum EstimatorError {
    #[error("no samples for curve '{label}'")]
    NoSamples { label: String },

    /// Durations must be finite and non-negative.
    #[error("invalid duration {duration} for curve '{label}'")]
    InvalidDuration { label: String, duration: f64 },
}

/// Errors raised while writing charts and tables.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build SVG: {message}")]
    Xml { message: String },

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
