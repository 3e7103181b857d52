//! Mortality file combination.

use registry_ingest::{MortalityColumns, combine_mortality_files, load_mortality_source};
use tempfile::TempDir;

const HEADER: &str = "RUN,DIA_DEF,MES_DEF,ANO_DEF,DIAG1,EDAD";

#[test]
fn test_combines_files_in_filename_order() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("DEF_2019.csv"),
        format!("{HEADER}\n202,1,2,2019,I219,80\n"),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("DEF_2018.csv"),
        format!("{HEADER}\n101,5,3,2018,C340,70\n103,7,7,2018,C349,55\n"),
    )
    .unwrap();

    let source = combine_mortality_files(dir.path(), &MortalityColumns::default()).unwrap();
    assert_eq!(source.rows.len(), 3);
    assert_eq!(source.rows[0].person_id, "101");
    assert_eq!(source.rows[2].primary_cause, "I219");
    assert_eq!(source.loaded.len(), 2);
    assert!(source.skipped.is_empty());
}

#[test]
fn test_bad_file_is_skipped_and_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("DEF_2018.csv"),
        format!("{HEADER}\n101,5,3,2018,C340,70\n"),
    )
    .unwrap();
    std::fs::write(dir.path().join("DEF_2019.csv"), "RUN,DIAG1\n1,C349\n").unwrap();

    let source = combine_mortality_files(dir.path(), &MortalityColumns::default()).unwrap();
    assert_eq!(source.rows.len(), 1);
    assert_eq!(source.skipped.len(), 1);
    assert!(source.skipped[0].reason.contains("DIA_DEF"));
}

#[test]
fn test_empty_directory_yields_empty_source() {
    let dir = TempDir::new().unwrap();
    let source = combine_mortality_files(dir.path(), &MortalityColumns::default()).unwrap();
    assert!(source.rows.is_empty());
    assert!(source.loaded.is_empty());
}

#[test]
fn test_single_file_source() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deaths.csv");
    std::fs::write(&path, format!("{HEADER}\n101,5,3,2018,C340,70\n")).unwrap();

    let source = load_mortality_source(&path, &MortalityColumns::default()).unwrap();
    assert_eq!(source.rows.len(), 1);
    assert!(load_mortality_source(&dir.path().join("nope.csv"), &MortalityColumns::default()).is_err());
}
