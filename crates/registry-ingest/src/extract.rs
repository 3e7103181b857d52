//! Column extraction from loaded tables into raw registry rows.
//!
//! Column names are matched case-insensitively. Required columns must be
//! present; outcome and retained columns are taken when they exist.

use std::collections::BTreeMap;

use polars::prelude::*;
use registry_model::{ColumnLookup, MortalityColumns, RawMortalityRow, RawTumorRow, TumorColumns};

use crate::error::{IngestError, Result};
use crate::frames::DEATH_DATE_COLUMN;
use crate::polars_utils::column_strings;

/// A linked stage-table row: the tumor fields plus the linkage outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLinkedRow {
    pub tumor: RawTumorRow,
    pub death_date: String,
    pub primary_cause: String,
}

struct FrameColumns<'a> {
    df: &'a DataFrame,
    lookup: ColumnLookup,
    source_name: &'a str,
}

impl<'a> FrameColumns<'a> {
    fn new(df: &'a DataFrame, source_name: &'a str) -> Self {
        let lookup = ColumnLookup::new(df.get_column_names().into_iter().map(PlSmallStr::as_str));
        Self {
            df,
            lookup,
            source_name,
        }
    }

    fn required(&self, name: &str) -> Result<Vec<String>> {
        self.optional(name)?
            .ok_or_else(|| IngestError::MissingColumn {
                column: name.to_string(),
                source_name: self.source_name.to_string(),
            })
    }

    fn optional(&self, name: &str) -> Result<Option<Vec<String>>> {
        match self.lookup.get(name) {
            Some(actual) => Ok(Some(column_strings(self.df, actual)?)),
            None => Ok(None),
        }
    }

    fn or_blank(&self, name: &str) -> Result<Vec<String>> {
        Ok(self
            .optional(name)?
            .unwrap_or_else(|| vec![String::new(); self.df.height()]))
    }

    fn check_required<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> Result<()> {
        for name in names {
            if !self.lookup.contains(name) {
                return Err(IngestError::MissingColumn {
                    column: name.to_string(),
                    source_name: self.source_name.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn take(values: &mut [String], idx: usize) -> String {
    std::mem::take(&mut values[idx])
}

/// Extracts raw tumor rows using the configured column names.
///
/// Retained passthrough columns missing from the table are skipped.
pub fn tumor_rows_from_frame(
    df: &DataFrame,
    columns: &TumorColumns,
    source_name: &str,
) -> Result<Vec<RawTumorRow>> {
    let frame = FrameColumns::new(df, source_name);
    frame.check_required(columns.required())?;

    let mut person_id = frame.required(&columns.person_id)?;
    let mut region = frame.required(&columns.region)?;
    let mut diagnosis_date = frame.required(&columns.diagnosis_date)?;
    let mut birth_date = frame.required(&columns.birth_date)?;
    let mut last_contact_date = frame.required(&columns.last_contact_date)?;
    let mut site = frame.required(&columns.site)?;
    let mut behavior = frame.required(&columns.behavior)?;
    let mut sex = frame.required(&columns.sex)?;
    let mut vital_status = frame.or_blank(&columns.vital_status)?;
    let mut cause_of_death = frame.or_blank(&columns.cause_of_death)?;

    let mut retained = Vec::new();
    for name in &columns.retained {
        match frame.optional(name)? {
            Some(values) => retained.push((name.clone(), values)),
            None => tracing::debug!(column = %name, source = source_name, "retained column absent"),
        }
    }

    let rows = (0..df.height())
        .map(|idx| RawTumorRow {
            person_id: take(&mut person_id, idx),
            region: take(&mut region, idx),
            diagnosis_date: take(&mut diagnosis_date, idx),
            birth_date: take(&mut birth_date, idx),
            last_contact_date: take(&mut last_contact_date, idx),
            site: take(&mut site, idx),
            behavior: take(&mut behavior, idx),
            sex: take(&mut sex, idx),
            vital_status: take(&mut vital_status, idx),
            cause_of_death: take(&mut cause_of_death, idx),
            retained: retained
                .iter_mut()
                .map(|(name, values)| (name.clone(), take(values, idx)))
                .collect::<BTreeMap<_, _>>(),
        })
        .collect();
    Ok(rows)
}

/// Extracts raw mortality rows using the configured column names.
pub fn mortality_rows_from_frame(
    df: &DataFrame,
    columns: &MortalityColumns,
    source_name: &str,
) -> Result<Vec<RawMortalityRow>> {
    let frame = FrameColumns::new(df, source_name);
    frame.check_required(columns.required())?;

    let mut person_id = frame.required(&columns.person_id)?;
    let mut day = frame.required(&columns.day)?;
    let mut month = frame.required(&columns.month)?;
    let mut year = frame.required(&columns.year)?;
    let mut primary_cause = frame.required(&columns.primary_cause)?;

    Ok((0..df.height())
        .map(|idx| RawMortalityRow {
            person_id: take(&mut person_id, idx),
            day: take(&mut day, idx),
            month: take(&mut month, idx),
            year: take(&mut year, idx),
            primary_cause: take(&mut primary_cause, idx),
        })
        .collect())
}

/// Extracts rows of a linked stage table.
///
/// The death date and primary cause columns are optional so that a cohort
/// table without linkage columns reads as all-alive.
pub fn linked_rows_from_frame(
    df: &DataFrame,
    columns: &TumorColumns,
    mortality_columns: &MortalityColumns,
    source_name: &str,
) -> Result<Vec<RawLinkedRow>> {
    let tumors = tumor_rows_from_frame(df, columns, source_name)?;
    let frame = FrameColumns::new(df, source_name);
    let mut death_date = frame.or_blank(DEATH_DATE_COLUMN)?;
    let mut primary_cause = frame.or_blank(&mortality_columns.primary_cause)?;

    Ok(tumors
        .into_iter()
        .enumerate()
        .map(|(idx, tumor)| RawLinkedRow {
            tumor,
            death_date: take(&mut death_date, idx),
            primary_cause: take(&mut primary_cause, idx),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_df(columns: &[(&str, &[&str])]) -> DataFrame {
        let cols: Vec<Column> = columns
            .iter()
            .map(|(name, values)| Series::new((*name).into(), values.to_vec()).into_column())
            .collect();
        DataFrame::new(cols).unwrap()
    }

    fn tumor_df() -> DataFrame {
        test_df(&[
            ("rut", &["101", "102"]),
            ("REGCOM", &["2101", "2201"]),
            ("FECDIAG", &["20150601", "20160101"]),
            ("FECNAC", &["19750315", "19450101"]),
            ("FECCON", &["", "20170101"]),
            ("TOP", &["339", "619"]),
            ("COMP", &["3", "3"]),
            ("SEXO", &["1", "1"]),
            ("MORF", &["8140", "8500"]),
            ("EXTRA", &["x", "y"]),
        ])
    }

    #[test]
    fn test_tumor_rows_case_insensitive() {
        let rows = tumor_rows_from_frame(&tumor_df(), &TumorColumns::default(), "tumors.csv")
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].person_id, "101");
        assert_eq!(rows[1].last_contact_date, "20170101");
        assert_eq!(rows[0].vital_status, "");
        assert_eq!(rows[0].retained.get("MORF").map(String::as_str), Some("8140"));
        assert!(!rows[0].retained.contains_key("EXTRA"));
    }

    #[test]
    fn test_missing_required_column() {
        let df = test_df(&[("RUT", &["1"]), ("TOP", &["339"])]);
        let err = tumor_rows_from_frame(&df, &TumorColumns::default(), "tumors.csv").unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn { ref column, .. } if column == "REGCOM"
        ));
    }

    #[test]
    fn test_mortality_rows() {
        let df = test_df(&[
            ("RUN", &["101"]),
            ("DIA_DEF", &["5"]),
            ("MES_DEF", &["3"]),
            ("ANO_DEF", &["2018"]),
            ("DIAG1", &["C340"]),
            ("OTHER", &["z"]),
        ]);
        let rows = mortality_rows_from_frame(&df, &MortalityColumns::default(), "DEF.csv").unwrap();
        assert_eq!(
            rows,
            vec![RawMortalityRow {
                person_id: "101".into(),
                day: "5".into(),
                month: "3".into(),
                year: "2018".into(),
                primary_cause: "C340".into(),
            }]
        );
    }
}
