//! Registry table ingestion and export.
//!
//! This crate is the tabular source/sink of the pipeline: it loads tumor and
//! mortality exports (CSV via Polars, spreadsheets via calamine) into raw
//! registry rows, and turns typed records back into stage tables.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use registry_ingest::{read_table, tumor_rows_from_frame, TumorColumns};
//!
//! let path = Path::new("data/concord.xlsx");
//! let df = read_table(path)?;
//! let rows = tumor_rows_from_frame(&df, &TumorColumns::default(), "concord.xlsx")?;
//! ```

mod discovery;
mod error;
mod extract;
mod frames;
mod mortality;
mod polars_utils;
mod table;

// === Error Types ===
pub use error::{IngestError, Result};

// === Table Reading and Writing ===
pub use table::{TableFormat, read_csv_table, read_table, read_workbook_table, write_csv_table};

// === File Discovery ===
pub use discovery::list_table_files;

// === Row Extraction ===
pub use extract::{
    RawLinkedRow, linked_rows_from_frame, mortality_rows_from_frame, tumor_rows_from_frame,
};

// === Mortality Sources ===
pub use mortality::{
    LoadedFile, MortalitySource, SkippedFile, combine_mortality_files, load_mortality_source,
    read_mortality_file,
};

// === Stage Tables ===
pub use frames::{
    AGE_COLUMN, DEATH_DATE_COLUMN, SURVIVAL_DAYS_COLUMN, linked_frame, mortality_frame,
    tumor_frame,
};

// === Utilities ===
pub use polars_utils::{any_to_string, column_strings, format_numeric};

pub use polars::prelude::DataFrame;
pub use registry_model::{MortalityColumns, TumorColumns};
