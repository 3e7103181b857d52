//! Stage tables: typed records back into DataFrames for export.
//!
//! Stage tables reuse the source column names so that each exported table
//! can be fed to the next command. Dates are written as ISO `YYYY-MM-DD`
//! and coded fields as the registry's numeric codes.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use polars::prelude::*;
use registry_model::{LinkedRecord, MortalityColumns, RawMortalityRow, TumorColumns, TumorRecord};

use crate::error::Result;

/// Age at diagnosis in whole years.
pub const AGE_COLUMN: &str = "edad_diagnostico";
/// Days from diagnosis to last contact.
pub const SURVIVAL_DAYS_COLUMN: &str = "tiempo_sobrevida";
/// Composed death date of the linked mortality registration.
pub const DEATH_DATE_COLUMN: &str = "FECHA_DEF";

fn iso(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn text<T: ToString>(value: Option<&T>) -> Option<String> {
    value.map(ToString::to_string)
}

/// Retained column names present in any record, in configured order.
fn retained_names<'a>(
    columns: &'a TumorColumns,
    records: impl Iterator<Item = &'a TumorRecord>,
) -> Vec<&'a str> {
    let present: BTreeSet<&str> = records
        .flat_map(|record| record.retained.keys().map(String::as_str))
        .collect();
    columns
        .retained
        .iter()
        .map(String::as_str)
        .filter(|name| present.contains(name))
        .collect()
}

fn tumor_columns<'a>(
    records: &[&'a TumorRecord],
    columns: &'a TumorColumns,
) -> Vec<Column> {
    let col = |name: &str, values: Vec<Option<String>>| Series::new(name.into(), values).into_column();
    let int = |name: &str, values: Vec<Option<i64>>| Series::new(name.into(), values).into_column();

    let mut out = vec![
        col(
            columns.person_id.as_str(),
            records.iter().map(|r| text(r.person_id.as_ref())).collect(),
        ),
        col(
            columns.region.as_str(),
            records.iter().map(|r| text(r.region.as_ref())).collect(),
        ),
        col(
            columns.diagnosis_date.as_str(),
            records.iter().map(|r| iso(r.diagnosis_date)).collect(),
        ),
        col(
            columns.birth_date.as_str(),
            records.iter().map(|r| iso(r.birth_date)).collect(),
        ),
        col(
            columns.last_contact_date.as_str(),
            records.iter().map(|r| iso(r.last_contact_date)).collect(),
        ),
        col(
            columns.site.as_str(),
            records.iter().map(|r| text(r.site.as_ref())).collect(),
        ),
        int(
            columns.behavior.as_str(),
            records
                .iter()
                .map(|r| r.behavior.map(|b| i64::from(b.code())))
                .collect(),
        ),
        int(
            columns.sex.as_str(),
            records
                .iter()
                .map(|r| r.sex.map(|s| i64::from(s.code())))
                .collect(),
        ),
        int(
            columns.vital_status.as_str(),
            records
                .iter()
                .map(|r| Some(i64::from(r.vital_status.code())))
                .collect(),
        ),
        int(
            columns.cause_of_death.as_str(),
            records
                .iter()
                .map(|r| r.cause_of_death.map(|c| i64::from(c.code())))
                .collect(),
        ),
        int(
            AGE_COLUMN,
            records
                .iter()
                .map(|r| r.age_at_diagnosis.map(i64::from))
                .collect(),
        ),
        int(
            SURVIVAL_DAYS_COLUMN,
            records.iter().map(|r| r.survival_days).collect(),
        ),
    ];

    for name in retained_names(columns, records.iter().copied()) {
        out.push(col(
            name,
            records
                .iter()
                .map(|r| r.retained.get(name).cloned())
                .collect(),
        ));
    }
    out
}

/// Builds the adjusted-cohort stage table.
pub fn tumor_frame(records: &[TumorRecord], columns: &TumorColumns) -> Result<DataFrame> {
    let refs: Vec<&TumorRecord> = records.iter().collect();
    Ok(DataFrame::new(tumor_columns(&refs, columns))?)
}

/// Builds the linked-cohort stage table: the cohort columns plus the death
/// date and primary cause of the matched mortality registration.
pub fn linked_frame(
    records: &[LinkedRecord],
    columns: &TumorColumns,
    mortality_columns: &MortalityColumns,
) -> Result<DataFrame> {
    let refs: Vec<&TumorRecord> = records.iter().map(|linked| &linked.record).collect();
    let mut out = tumor_columns(&refs, columns);
    out.push(
        Series::new(
            DEATH_DATE_COLUMN.into(),
            records
                .iter()
                .map(|linked| iso(linked.death_date))
                .collect::<Vec<_>>(),
        )
        .into_column(),
    );
    out.push(
        Series::new(
            mortality_columns.primary_cause.as_str().into(),
            records
                .iter()
                .map(|linked| linked.primary_cause.clone())
                .collect::<Vec<_>>(),
        )
        .into_column(),
    );
    Ok(DataFrame::new(out)?)
}

/// Builds the combined mortality table with the configured column names.
pub fn mortality_frame(rows: &[RawMortalityRow], columns: &MortalityColumns) -> Result<DataFrame> {
    let mut person_id = Vec::with_capacity(rows.len());
    let mut day = Vec::with_capacity(rows.len());
    let mut month = Vec::with_capacity(rows.len());
    let mut year = Vec::with_capacity(rows.len());
    let mut primary_cause = Vec::with_capacity(rows.len());
    for row in rows {
        person_id.push(row.person_id.as_str());
        day.push(row.day.as_str());
        month.push(row.month.as_str());
        year.push(row.year.as_str());
        primary_cause.push(row.primary_cause.as_str());
    }
    Ok(DataFrame::new(vec![
        Series::new(columns.person_id.as_str().into(), person_id).into_column(),
        Series::new(columns.day.as_str().into(), day).into_column(),
        Series::new(columns.month.as_str().into(), month).into_column(),
        Series::new(columns.year.as_str().into(), year).into_column(),
        Series::new(columns.primary_cause.as_str().into(), primary_cause).into_column(),
    ])?)
}
