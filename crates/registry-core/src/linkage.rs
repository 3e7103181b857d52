//! Mortality linkage.
//!
//! Every cohort record is matched against the mortality source on the
//! canonical person identifier. A match with a usable death date makes the
//! record dead; anything else (no match, no identifier, or only registrations
//! whose day/month/year is not a calendar date) leaves it alive and censored.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use registry_model::{
    CauseOfDeath, DuplicatePolicy, LinkageOptions, LinkedRecord, MortalityRecord, PersonId,
    TumorRecord,
};
use registry_transform::elapsed_days;

use crate::error::{LinkageError, Result};

/// Maximum number of duplicated identifiers quoted in an error message.
const DUPLICATE_SAMPLE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkageReport {
    pub tumor_records: usize,
    pub mortality_records: usize,
    /// Mortality rows without a usable person identifier.
    pub mortality_without_id: usize,
    /// Mortality rows whose day/month/year is not a calendar date.
    pub invalid_death_dates: usize,
    /// Cohort records linked to a usable death registration.
    pub matched: usize,
    /// Cohort records whose identifier matched only unusable registrations.
    pub matched_without_date: usize,
    pub unmatched: usize,
    pub deaths_cancer: usize,
    pub deaths_other: usize,
    /// Identifiers with more than one mortality registration, sorted.
    pub duplicate_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LinkOutcome {
    pub records: Vec<LinkedRecord>,
    pub report: LinkageReport,
}

/// Registrations per person, in source order.
struct MortalityIndex<'a> {
    by_person: HashMap<&'a PersonId, Vec<(usize, &'a MortalityRecord)>>,
}

impl<'a> MortalityIndex<'a> {
    fn build(mortality: &'a [MortalityRecord], report: &mut LinkageReport) -> Self {
        let mut by_person: HashMap<&PersonId, Vec<(usize, &MortalityRecord)>> = HashMap::new();
        for (idx, record) in mortality.iter().enumerate() {
            if record.death_date().is_none() {
                report.invalid_death_dates += 1;
            }
            match record.person_id.as_ref() {
                Some(id) => by_person.entry(id).or_default().push((idx, record)),
                None => report.mortality_without_id += 1,
            }
        }
        Self { by_person }
    }

    fn duplicate_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .by_person
            .iter()
            .filter(|(_, records)| records.len() > 1)
            .map(|(id, _)| id.as_str().to_string())
            .collect();
        ids.sort();
        ids
    }

    fn candidates(&self, id: &PersonId) -> Option<&[(usize, &'a MortalityRecord)]> {
        self.by_person.get(id).map(Vec::as_slice)
    }
}

/// Picks the registration used for a person according to the policy.
fn resolve<'a>(
    candidates: &[(usize, &'a MortalityRecord)],
    policy: DuplicatePolicy,
) -> Option<(NaiveDate, &'a MortalityRecord)> {
    let mut usable = candidates
        .iter()
        .filter_map(|(idx, record)| record.death_date().map(|date| (date, *idx, *record)));
    let chosen = match policy {
        DuplicatePolicy::First | DuplicatePolicy::Strict => usable.next(),
        DuplicatePolicy::Earliest => usable.min_by_key(|(date, idx, _)| (*date, *idx)),
    };
    chosen.map(|(date, _, record)| (date, record))
}

/// Links cohort records against the mortality source.
///
/// Returns one linked record per input record, in input order. Under the
/// `strict` policy a duplicated identifier anywhere in the mortality source
/// is an error.
pub fn link(
    tumors: &[TumorRecord],
    mortality: &[MortalityRecord],
    options: &LinkageOptions,
) -> Result<LinkOutcome> {
    let mut report = LinkageReport {
        tumor_records: tumors.len(),
        mortality_records: mortality.len(),
        ..LinkageReport::default()
    };
    let index = MortalityIndex::build(mortality, &mut report);
    report.duplicate_ids = index.duplicate_ids();

    if !report.duplicate_ids.is_empty() {
        warn!(
            stage = "link",
            duplicates = report.duplicate_ids.len(),
            policy = ?options.duplicate_policy,
            "mortality source has duplicated person identifiers"
        );
        if options.duplicate_policy == DuplicatePolicy::Strict {
            return Err(LinkageError::DuplicateIdentifiers {
                count: report.duplicate_ids.len(),
                sample: report
                    .duplicate_ids
                    .iter()
                    .take(DUPLICATE_SAMPLE)
                    .cloned()
                    .collect(),
            });
        }
    }

    let records: Vec<LinkedRecord> = tumors
        .iter()
        .map(|tumor| {
            let candidates = tumor
                .person_id
                .as_ref()
                .and_then(|id| index.candidates(id));
            let linked = match candidates {
                None => {
                    report.unmatched += 1;
                    LinkedRecord::alive(tumor.clone(), options.cutoff_date)
                }
                Some(candidates) => match resolve(candidates, options.duplicate_policy) {
                    Some((death_date, death)) => {
                        report.matched += 1;
                        LinkedRecord::dead(
                            tumor.clone(),
                            death_date,
                            death.primary_cause.clone(),
                            &options.cancer_cause_prefix,
                        )
                    }
                    None => {
                        report.matched_without_date += 1;
                        LinkedRecord::alive(tumor.clone(), options.cutoff_date)
                    }
                },
            };
            match linked.cause_of_death() {
                Some(CauseOfDeath::Cancer) => report.deaths_cancer += 1,
                Some(CauseOfDeath::Other) => report.deaths_other += 1,
                None => {}
            }
            refresh_survival_days(linked)
        })
        .collect();

    info!(
        stage = "link",
        matched = report.matched,
        unmatched = report.unmatched,
        matched_without_date = report.matched_without_date,
        deaths_cancer = report.deaths_cancer,
        deaths_other = report.deaths_other,
        "linkage complete"
    );
    Ok(LinkOutcome { records, report })
}

/// Recomputes the survival days against the effective last contact.
fn refresh_survival_days(mut linked: LinkedRecord) -> LinkedRecord {
    linked.record.survival_days = match (
        linked.record.diagnosis_date,
        linked.effective_last_contact(),
    ) {
        (Some(diagnosis), Some(last_contact)) => Some(elapsed_days(diagnosis, last_contact)),
        _ => None,
    };
    linked
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_model::{RawMortalityRow, VitalStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tumor(id: &str) -> TumorRecord {
        let mut record = TumorRecord::empty();
        record.person_id = PersonId::parse(id);
        record.diagnosis_date = Some(date(2015, 6, 1));
        record
    }

    fn death(id: &str, day: &str, month: &str, year: &str, cause: &str) -> MortalityRecord {
        MortalityRecord::from_raw(&RawMortalityRow {
            person_id: id.into(),
            day: day.into(),
            month: month.into(),
            year: year.into(),
            primary_cause: cause.into(),
        })
    }

    #[test]
    fn classifies_cause_by_prefix() {
        let tumors = [tumor("1"), tumor("2")];
        let deaths = [
            death("1", "5", "3", "2018", "C349"),
            death("2", "5", "3", "2018", "I219"),
        ];
        let outcome = link(&tumors, &deaths, &LinkageOptions::default()).unwrap();
        assert_eq!(
            outcome.records[0].cause_of_death(),
            Some(CauseOfDeath::Cancer)
        );
        assert_eq!(
            outcome.records[1].cause_of_death(),
            Some(CauseOfDeath::Other)
        );
        assert_eq!(outcome.records[0].effective_last_contact(), Some(date(2018, 3, 5)));
        assert_eq!(outcome.report.deaths_cancer, 1);
        assert_eq!(outcome.report.deaths_other, 1);
    }

    #[test]
    fn unmatched_and_unusable_dates_stay_alive() {
        let tumors = [tumor("1"), tumor("2"), TumorRecord::empty()];
        let deaths = [death("2", "31", "2", "2018", "C349")];
        let outcome = link(&tumors, &deaths, &LinkageOptions::default()).unwrap();

        for linked in &outcome.records {
            assert_eq!(linked.vital_status(), VitalStatus::Alive);
            assert_eq!(linked.cause_of_death(), None);
            assert_eq!(linked.death_date, None);
            assert_eq!(linked.effective_last_contact(), Some(date(2019, 12, 31)));
        }
        assert_eq!(outcome.report.unmatched, 2);
        assert_eq!(outcome.report.matched_without_date, 1);
        assert_eq!(outcome.report.invalid_death_dates, 1);
    }

    #[test]
    fn identifier_formats_are_canonicalized() {
        let tumors = [tumor("0012345678-k")];
        let deaths = [death("12.345.678-K", "1", "1", "2019", "C50")];
        let outcome = link(&tumors, &deaths, &LinkageOptions::default()).unwrap();
        assert_eq!(outcome.report.matched, 1);
    }

    #[test]
    fn duplicate_policies() {
        let tumors = [tumor("7")];
        let deaths = [
            death("7", "1", "6", "2019", "I219"),
            death("7", "1", "6", "2018", "C349"),
            death("7", "40", "6", "2017", "C349"),
        ];

        let earliest = link(&tumors, &deaths, &LinkageOptions::default()).unwrap();
        assert_eq!(earliest.records[0].death_date, Some(date(2018, 6, 1)));
        assert_eq!(earliest.report.duplicate_ids, vec!["7".to_string()]);

        let first = LinkageOptions {
            duplicate_policy: DuplicatePolicy::First,
            ..LinkageOptions::default()
        };
        let outcome = link(&tumors, &deaths, &first).unwrap();
        assert_eq!(outcome.records[0].death_date, Some(date(2019, 6, 1)));
        assert_eq!(outcome.records[0].cause_of_death(), Some(CauseOfDeath::Other));

        let strict = LinkageOptions {
            duplicate_policy: DuplicatePolicy::Strict,
            ..LinkageOptions::default()
        };
        assert!(matches!(
            link(&tumors, &deaths, &strict),
            Err(LinkageError::DuplicateIdentifiers { count: 1, .. })
        ));
    }

    #[test]
    fn survival_days_follow_effective_last_contact() {
        let outcome = link(
            &[tumor("1"), tumor("2")],
            &[death("1", "1", "6", "2016", "C349")],
            &LinkageOptions::default(),
        )
        .unwrap();
        assert_eq!(outcome.records[0].record.survival_days, Some(366));
        assert_eq!(
            outcome.records[1].record.survival_days,
            Some(elapsed_days(date(2015, 6, 1), date(2019, 12, 31)))
        );
    }
}
