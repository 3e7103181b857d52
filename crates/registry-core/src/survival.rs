//! Survival dataset assembly.

use serde::Serialize;
use tracing::{info, warn};

use registry_model::{LinkedRecord, StratumKey, SurvivalObservation, TimeUnit, TumorGroups};
use registry_transform::elapsed_days;

/// Why a linked record yields no observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Diagnosis date or effective last contact is missing.
    MissingDuration,
    /// Effective last contact precedes diagnosis.
    NegativeDuration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SurvivalReport {
    pub records: usize,
    pub observations: usize,
    pub missing_duration: usize,
    pub negative_duration: usize,
    pub events: usize,
    pub censored: usize,
    pub unit: TimeUnit,
}

#[derive(Debug, Clone)]
pub struct SurvivalDataset {
    pub observations: Vec<SurvivalObservation>,
    pub report: SurvivalReport,
}

/// Maps one linked record to its observation.
///
/// Negative durations are excluded, never clamped or mirrored.
pub fn observation_for(
    linked: &LinkedRecord,
    groups: &TumorGroups,
    unit: TimeUnit,
) -> Result<SurvivalObservation, Exclusion> {
    let record = &linked.record;
    let (Some(diagnosis), Some(last_contact)) =
        (record.diagnosis_date, linked.effective_last_contact())
    else {
        return Err(Exclusion::MissingDuration);
    };
    let days = elapsed_days(diagnosis, last_contact);
    if days < 0 {
        return Err(Exclusion::NegativeDuration);
    }
    Ok(SurvivalObservation {
        person_id: record.person_id.clone(),
        duration: unit.from_days(days),
        unit,
        event: linked.vital_status().is_dead(),
        key: StratumKey {
            group: groups.resolve(record.site.as_ref()).to_string(),
            region: record.region.clone(),
            sex: record.sex,
        },
    })
}

/// Builds the observation set, counting every excluded record.
pub fn build_observations(
    records: &[LinkedRecord],
    groups: &TumorGroups,
    unit: TimeUnit,
) -> SurvivalDataset {
    let mut report = SurvivalReport {
        records: records.len(),
        unit,
        ..SurvivalReport::default()
    };
    let mut observations = Vec::with_capacity(records.len());
    for linked in records {
        match observation_for(linked, groups, unit) {
            Ok(observation) => {
                if observation.event {
                    report.events += 1;
                } else {
                    report.censored += 1;
                }
                observations.push(observation);
            }
            Err(Exclusion::MissingDuration) => report.missing_duration += 1,
            Err(Exclusion::NegativeDuration) => report.negative_duration += 1,
        }
    }
    report.observations = observations.len();

    if report.negative_duration > 0 {
        warn!(
            stage = "survival",
            excluded = report.negative_duration,
            "records with last contact before diagnosis excluded"
        );
    }
    info!(
        stage = "survival",
        observations = report.observations,
        events = report.events,
        censored = report.censored,
        missing_duration = report.missing_duration,
        unit = %unit,
        "survival dataset built"
    );
    SurvivalDataset {
        observations,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use registry_model::{SiteCode, TumorGroup, TumorRecord, OTHER_GROUP};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn groups() -> TumorGroups {
        TumorGroups::new(vec![TumorGroup::new(
            "Lung",
            ["33.9", "340"].iter().filter_map(|c| SiteCode::parse(c)),
        )])
    }

    fn alive(diagnosis: Option<NaiveDate>, last_contact: NaiveDate, site: &str) -> LinkedRecord {
        let mut record = TumorRecord::empty();
        record.diagnosis_date = diagnosis;
        record.last_contact_date = Some(last_contact);
        record.site = SiteCode::parse(site);
        LinkedRecord::alive(record, date(2019, 12, 31))
    }

    #[test]
    fn negative_duration_is_dropped() {
        let linked = alive(Some(date(2015, 6, 1)), date(2015, 1, 1), "339");
        assert_eq!(
            observation_for(&linked, &groups(), TimeUnit::Days),
            Err(Exclusion::NegativeDuration)
        );
        let dataset = build_observations(&[linked], &groups(), TimeUnit::Days);
        assert!(dataset.observations.is_empty());
        assert_eq!(dataset.report.negative_duration, 1);
    }

    #[test]
    fn missing_diagnosis_is_dropped() {
        let linked = alive(None, date(2015, 1, 1), "339");
        let dataset = build_observations(&[linked], &groups(), TimeUnit::Years);
        assert_eq!(dataset.report.missing_duration, 1);
    }

    #[test]
    fn zero_duration_is_kept() {
        let linked = alive(Some(date(2015, 6, 1)), date(2015, 6, 1), "C33.9");
        let observation = observation_for(&linked, &groups(), TimeUnit::Years).unwrap();
        assert_eq!(observation.duration, 0.0);
        assert!(!observation.event);
        assert_eq!(observation.key.group, "Lung");
    }

    #[test]
    fn unmatched_site_goes_to_other() {
        let linked = alive(Some(date(2015, 6, 1)), date(2016, 6, 1), "500");
        let observation = observation_for(&linked, &groups(), TimeUnit::Days).unwrap();
        assert_eq!(observation.key.group, OTHER_GROUP);
        assert_eq!(observation.duration, 366.0);
    }
}
