//! Derived fields: age at diagnosis and survival duration.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::info;

use registry_model::TumorRecord;

/// Whole years elapsed from `birth` to `at`.
///
/// Uses calendar arithmetic: one year is subtracted when the month/day of
/// `at` precedes the month/day of `birth`. Returns `None` when `at` is
/// before `birth`.
pub fn age_at(birth: NaiveDate, at: NaiveDate) -> Option<i32> {
    if at < birth {
        return None;
    }
    let mut years = at.year() - birth.year();
    if (at.month(), at.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    Some(years)
}

/// Signed number of days from `from` to `to`.
pub fn elapsed_days(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeriveReport {
    pub rows: usize,
    pub missing_age: usize,
    pub missing_survival: usize,
    /// Last contact recorded before diagnosis.
    pub negative_survival: usize,
}

#[derive(Debug, Clone)]
pub struct DerivedTable {
    pub records: Vec<TumorRecord>,
    pub report: DeriveReport,
}

fn derive_record(mut record: TumorRecord) -> TumorRecord {
    record.age_at_diagnosis = match (record.birth_date, record.diagnosis_date) {
        (Some(birth), Some(diagnosis)) => age_at(birth, diagnosis),
        _ => None,
    };
    record.survival_days = match (record.diagnosis_date, record.last_contact_date) {
        (Some(diagnosis), Some(last_contact)) => Some(elapsed_days(diagnosis, last_contact)),
        _ => None,
    };
    record
}

/// Fill `age_at_diagnosis` and `survival_days` on every record.
///
/// Either field stays missing when one of its dates is missing. Negative
/// survival is kept here and dropped when the survival dataset is built.
pub fn derive_fields(records: &[TumorRecord]) -> DerivedTable {
    let mut report = DeriveReport::default();
    let records: Vec<TumorRecord> = records
        .iter()
        .cloned()
        .map(derive_record)
        .inspect(|record| {
            report.rows += 1;
            report.missing_age += usize::from(record.age_at_diagnosis.is_none());
            match record.survival_days {
                None => report.missing_survival += 1,
                Some(days) if days < 0 => report.negative_survival += 1,
                Some(_) => {}
            }
        })
        .collect();
    info!(
        stage = "derive",
        rows = report.rows,
        missing_age = report.missing_age,
        missing_survival = report.missing_survival,
        negative_survival = report.negative_survival,
        "derived fields computed"
    );
    DerivedTable { records, report }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_is_calendar_exact() {
        assert_eq!(age_at(date(1975, 3, 15), date(2015, 3, 14)), Some(39));
        assert_eq!(age_at(date(1975, 3, 15), date(2015, 3, 15)), Some(40));
        assert_eq!(age_at(date(2000, 2, 29), date(2015, 2, 28)), Some(14));
        assert_eq!(age_at(date(2000, 2, 29), date(2015, 3, 1)), Some(15));
        assert_eq!(age_at(date(2015, 1, 2), date(2015, 1, 1)), None);
    }

    #[test]
    fn elapsed_days_is_signed() {
        assert_eq!(elapsed_days(date(2015, 1, 1), date(2016, 1, 1)), 365);
        assert_eq!(elapsed_days(date(2015, 1, 2), date(2015, 1, 1)), -1);
    }

    #[test]
    fn missing_dates_leave_fields_missing() {
        let mut full = TumorRecord::empty();
        full.birth_date = Some(date(1950, 6, 1));
        full.diagnosis_date = Some(date(2015, 6, 1));
        full.last_contact_date = Some(date(2015, 5, 1));
        let mut partial = TumorRecord::empty();
        partial.diagnosis_date = Some(date(2015, 6, 1));

        let table = derive_fields(&[full, partial]);
        assert_eq!(table.records[0].age_at_diagnosis, Some(65));
        assert_eq!(table.records[0].survival_days, Some(-31));
        assert_eq!(table.records[1].age_at_diagnosis, None);
        assert_eq!(table.records[1].survival_days, None);
        assert_eq!(
            table.report,
            DeriveReport {
                rows: 2,
                missing_age: 1,
                missing_survival: 1,
                negative_survival: 1,
            }
        );
    }
}
