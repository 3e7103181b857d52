//! Cohort inclusion predicates.
//!
//! Each predicate reads a different field of the record and none of them
//! modifies a record, so the surviving set does not depend on the order in
//! which predicates are applied. Only the per-step removal counts do.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use chrono::Datelike;
use serde::Serialize;
use tracing::{info, warn};

use registry_model::{SiteCode, TumorRecord};

/// One inclusion rule of the analysis cohort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CohortPredicate {
    /// Keep malignant tumors only.
    Malignant,
    /// Keep tumors whose canonical site code is in the set.
    Site(BTreeSet<SiteCode>),
    /// Keep patients at least this old at diagnosis; unknown age is removed.
    MinimumAge(i32),
    /// Keep diagnoses whose year lies in the inclusive range; unknown
    /// diagnosis date is removed.
    DiagnosisYears(RangeInclusive<i32>),
}

impl CohortPredicate {
    pub fn name(&self) -> &'static str {
        match self {
            CohortPredicate::Malignant => "behavior",
            CohortPredicate::Site(_) => "site",
            CohortPredicate::MinimumAge(_) => "age",
            CohortPredicate::DiagnosisYears(_) => "diagnosis_year",
        }
    }

    pub fn keep(&self, record: &TumorRecord) -> bool {
        match self {
            CohortPredicate::Malignant => record.behavior.is_some_and(|code| code.is_malignant()),
            CohortPredicate::Site(codes) => record.site.as_ref().is_some_and(|site| codes.contains(site)),
            CohortPredicate::MinimumAge(minimum) => {
                record.age_at_diagnosis.is_some_and(|age| age >= *minimum)
            }
            CohortPredicate::DiagnosisYears(years) => record
                .diagnosis_date
                .is_some_and(|date| years.contains(&date.year())),
        }
    }
}

/// The registry's standard cohort: behavior, site, age, then year range.
pub fn standard_predicates(
    site_codes: BTreeSet<SiteCode>,
    minimum_age: i32,
    years: RangeInclusive<i32>,
) -> Vec<CohortPredicate> {
    vec![
        CohortPredicate::Malignant,
        CohortPredicate::Site(site_codes),
        CohortPredicate::MinimumAge(minimum_age),
        CohortPredicate::DiagnosisYears(years),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterStep {
    pub predicate: &'static str,
    pub removed: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub input: usize,
    pub steps: Vec<FilterStep>,
    pub output: usize,
}

impl FilterReport {
    pub fn removed(&self) -> usize {
        self.input - self.output
    }
}

#[derive(Debug, Clone)]
pub struct FilteredCohort {
    pub records: Vec<TumorRecord>,
    pub report: FilterReport,
}

/// Applies the predicates in order, reporting how many rows each removed.
///
/// An empty cohort is a valid outcome; it is logged, not an error.
pub fn apply_filters(records: &[TumorRecord], predicates: &[CohortPredicate]) -> FilteredCohort {
    let mut kept: Vec<TumorRecord> = records.to_vec();
    let mut report = FilterReport {
        input: records.len(),
        ..FilterReport::default()
    };

    for predicate in predicates {
        let before = kept.len();
        kept.retain(|record| predicate.keep(record));
        let step = FilterStep {
            predicate: predicate.name(),
            removed: before - kept.len(),
            remaining: kept.len(),
        };
        info!(
            stage = "cohort",
            predicate = step.predicate,
            removed = step.removed,
            remaining = step.remaining,
            "filter applied"
        );
        report.steps.push(step);
    }

    report.output = kept.len();
    if kept.is_empty() {
        warn!(stage = "cohort", input = report.input, "cohort is empty after filtering");
    }
    FilteredCohort {
        records: kept,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use registry_model::BehaviorCode;

    fn record(behavior: u8, site: &str, age: Option<i32>, year: Option<i32>) -> TumorRecord {
        let mut record = TumorRecord::empty();
        record.behavior = Some(BehaviorCode::new(behavior));
        record.site = SiteCode::parse(site);
        record.age_at_diagnosis = age;
        record.diagnosis_date = year.and_then(|y| NaiveDate::from_ymd_opt(y, 6, 1));
        record
    }

    fn lung() -> BTreeSet<SiteCode> {
        ["339", "340"].iter().filter_map(|c| SiteCode::parse(c)).collect()
    }

    #[test]
    fn each_predicate_removes_its_rows() {
        let records = vec![
            record(3, "339", Some(40), Some(2015)),
            record(2, "339", Some(40), Some(2015)),
            record(3, "619", Some(40), Some(2015)),
            record(3, "C34.0", Some(14), Some(2015)),
            record(3, "340", None, Some(2015)),
            record(3, "340", Some(70), Some(2010)),
            record(3, "340", Some(70), None),
        ];
        let cohort = apply_filters(&records, &standard_predicates(lung(), 15, 2011..=2019));

        assert_eq!(cohort.records, vec![records[0].clone()]);
        let removed: Vec<_> = cohort.report.steps.iter().map(|s| s.removed).collect();
        assert_eq!(removed, vec![1, 1, 2, 2]);
        assert_eq!(cohort.report.removed(), 6);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let records = vec![
            record(3, "339", Some(15), Some(2011)),
            record(3, "339", Some(15), Some(2019)),
            record(3, "339", Some(15), Some(2020)),
        ];
        let cohort = apply_filters(&records, &standard_predicates(lung(), 15, 2011..=2019));
        assert_eq!(cohort.records.len(), 2);
    }

    #[test]
    fn empty_cohort_is_not_an_error() {
        let cohort = apply_filters(&[], &standard_predicates(lung(), 15, 2011..=2019));
        assert!(cohort.records.is_empty());
        assert_eq!(cohort.report.steps.len(), 4);
    }
}
