//! Error types for registry table ingestion and export.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing registry tables.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Table file not found.
    #[error("table file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or write a file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension is not a supported table format.
    #[error("unsupported table format: {path}")]
    UnsupportedFormat { path: PathBuf },

    // === Parsing Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Failed to open or read a spreadsheet workbook.
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// Workbook has no worksheet or no header row.
    #[error("workbook has no data: {path}")]
    EmptyWorkbook { path: PathBuf },

    /// Required column not found in a source table.
    #[error("required column '{column}' not found in {source_name}")]
    MissingColumn { column: String, source_name: String },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// Failed to write a DataFrame as CSV.
    #[error("failed to write CSV {path}: {message}")]
    CsvWrite { path: PathBuf, message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
