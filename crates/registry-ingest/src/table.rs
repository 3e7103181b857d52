//! Table reading and writing.
//!
//! Source tables arrive as CSV or spreadsheet workbooks. Every column is read
//! as text so that identifiers and codes keep their leading zeros and decimal
//! points until the normalizer canonicalizes them.

use std::fs::File;
use std::path::Path;

use calamine::{Data, DataType as _, Reader, open_workbook_auto};
use polars::prelude::*;

use crate::error::{IngestError, Result};
use crate::polars_utils::format_numeric;

/// Supported table file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Workbook,
}

impl TableFormat {
    /// Detects the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Reads a table file into a DataFrame of string columns.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let df = match TableFormat::from_path(path) {
        Some(TableFormat::Csv) => read_csv_table(path)?,
        Some(TableFormat::Workbook) => read_workbook_table(path)?,
        None => {
            return Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };
    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "table loaded"
    );
    Ok(df)
}

/// Reads a CSV file with a single header row; all columns as strings.
pub fn read_csv_table(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(v) => format_numeric(*v),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(_) => cell
            .as_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    }
}

fn unique_header(name: String, idx: usize, seen: &mut Vec<String>) -> String {
    let base = if name.is_empty() {
        format!("column_{}", idx + 1)
    } else {
        name
    };
    let mut candidate = base.clone();
    let mut suffix = 2;
    while seen.contains(&candidate) {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    seen.push(candidate.clone());
    candidate
}

/// Reads the first worksheet of a workbook; the first row holds column names.
pub fn read_workbook_table(path: &Path) -> Result<DataFrame> {
    let workbook_error = |message: String| IngestError::Workbook {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::EmptyWorkbook {
            path: path.to_path_buf(),
        })?
        .map_err(|e| workbook_error(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(IngestError::EmptyWorkbook {
            path: path.to_path_buf(),
        });
    };
    let mut seen = Vec::with_capacity(header.len());
    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| unique_header(cell_to_string(cell), idx, &mut seen))
        .collect();

    let mut values: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (idx, column) in values.iter_mut().enumerate() {
            column.push(row.get(idx).map(cell_to_string).unwrap_or_default());
        }
    }

    let columns: Vec<Column> = names
        .into_iter()
        .zip(values)
        .map(|(name, column)| Series::new(name.into(), column).into_column())
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Writes a DataFrame as CSV with a header row.
pub fn write_csv_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IngestError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let mut file = File::create(path).map_err(|e| IngestError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| IngestError::CsvWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    tracing::info!(path = %path.display(), rows = df.height(), "table written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            TableFormat::from_path(Path::new("a/DEF_2019.XLSX")),
            Some(TableFormat::Workbook)
        );
        assert_eq!(
            TableFormat::from_path(Path::new("cohort.csv")),
            Some(TableFormat::Csv)
        );
        assert_eq!(TableFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(TableFormat::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_csv_columns_stay_text() {
        let file = create_temp_csv("RUT,TOP,FECDIAG\n007,33.9,20150601\n12,340,\n");
        let df = read_table(file.path()).unwrap();

        assert_eq!(df.height(), 2);
        let top = df.column("TOP").unwrap();
        assert_eq!(top.dtype(), &DataType::String);
        assert_eq!(
            crate::polars_utils::column_strings(&df, "RUT").unwrap(),
            vec!["007", "12"]
        );
        assert_eq!(
            crate::polars_utils::column_strings(&df, "FECDIAG").unwrap(),
            vec!["20150601", ""]
        );
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tumors.txt");
        std::fs::write(&path, "RUT\n1\n").unwrap();
        assert!(matches!(
            read_table(&path),
            Err(IngestError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_table(&dir.path().join("missing.csv")),
            Err(IngestError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stage").join("cohort.csv");
        let mut df = DataFrame::new(vec![
            Series::new("RUT".into(), vec!["1", "2"]).into_column(),
            Series::new("FECDIAG".into(), vec!["2015-06-01", ""]).into_column(),
        ])
        .unwrap();
        write_csv_table(&mut df, &path).unwrap();

        let back = read_table(&path).unwrap();
        assert_eq!(back.height(), 2);
        assert_eq!(back.get_column_names().len(), 2);
    }
}
