//! Table file discovery.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};
use crate::table::TableFormat;

/// Lists all CSV and workbook files in a directory.
///
/// Returns files sorted by filename. Spreadsheet lock files (`~$name.xlsx`)
/// are skipped.
pub fn list_table_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_lock_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("~$"));
        if is_lock_file {
            continue;
        }

        if TableFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_table_files() {
        let dir = TempDir::new().unwrap();
        for name in ["DEF_2019.xlsx", "DEF_2018.csv", "notes.txt", "~$DEF_2019.xlsx"] {
            std::fs::write(dir.path().join(name), "RUN\n1\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("archive.csv")).unwrap();

        let files = list_table_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["DEF_2018.csv", "DEF_2019.xlsx"]);
    }

    #[test]
    fn test_list_table_files_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("DEF.csv");
        std::fs::write(&file_path, "RUN\n").unwrap();

        assert!(matches!(
            list_table_files(&file_path),
            Err(IngestError::DirectoryNotFound { .. })
        ));
    }
}
