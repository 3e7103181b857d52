//! Mortality source combination.
//!
//! The mortality registry ships one file per year. Every table file in the
//! directory is loaded, reduced to the mortality columns and concatenated in
//! filename order. A file that fails to load is reported and skipped.

use std::path::{Path, PathBuf};

use registry_model::{MortalityColumns, RawMortalityRow};
use serde::Serialize;

use crate::discovery::list_table_files;
use crate::error::{IngestError, Result};
use crate::extract::mortality_rows_from_frame;
use crate::table::read_table;

/// A mortality file that was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// A mortality file that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Combined mortality rows and the per-file outcome.
#[derive(Debug, Clone, Default)]
pub struct MortalitySource {
    pub rows: Vec<RawMortalityRow>,
    pub loaded: Vec<LoadedFile>,
    pub skipped: Vec<SkippedFile>,
}

/// Loads one mortality table file.
pub fn read_mortality_file(path: &Path, columns: &MortalityColumns) -> Result<Vec<RawMortalityRow>> {
    let df = read_table(path)?;
    mortality_rows_from_frame(&df, columns, &path.display().to_string())
}

/// Combines every table file of a directory into one mortality source.
pub fn combine_mortality_files(dir: &Path, columns: &MortalityColumns) -> Result<MortalitySource> {
    let files = list_table_files(dir)?;
    if files.is_empty() {
        tracing::warn!(path = %dir.display(), "no mortality files found");
    }

    let mut source = MortalitySource::default();
    for path in files {
        match read_mortality_file(&path, columns) {
            Ok(rows) => {
                tracing::info!(path = %path.display(), rows = rows.len(), "mortality file loaded");
                source.loaded.push(LoadedFile {
                    path,
                    rows: rows.len(),
                });
                source.rows.extend(rows);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "mortality file skipped");
                source.skipped.push(SkippedFile {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }
    Ok(source)
}

/// Loads mortality rows from a single file or a directory of files.
pub fn load_mortality_source(path: &Path, columns: &MortalityColumns) -> Result<MortalitySource> {
    if path.is_dir() {
        return combine_mortality_files(path, columns);
    }
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let rows = read_mortality_file(path, columns)?;
    Ok(MortalitySource {
        loaded: vec![LoadedFile {
            path: path.to_path_buf(),
            rows: rows.len(),
        }],
        rows,
        skipped: Vec::new(),
    })
}
