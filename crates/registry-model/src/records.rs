//! Tumor, mortality and linked records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::codes::{PersonId, RegionCode, SiteCode};
use crate::enums::{BehaviorCode, CauseOfDeath, Sex, VitalStatus};

/// One tumor registration as read from the source table, all fields text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTumorRow {
    pub person_id: String,
    pub region: String,
    pub diagnosis_date: String,
    pub birth_date: String,
    pub last_contact_date: String,
    pub site: String,
    pub behavior: String,
    pub sex: String,
    pub vital_status: String,
    pub cause_of_death: String,
    /// Passthrough columns kept for audit exports, keyed by source column name.
    pub retained: BTreeMap<String, String>,
}

/// One death registration as read from the source table, all fields text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMortalityRow {
    pub person_id: String,
    pub day: String,
    pub month: String,
    pub year: String,
    pub primary_cause: String,
}

/// One tumor diagnosis after field normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TumorRecord {
    pub person_id: Option<PersonId>,
    pub region: Option<RegionCode>,
    pub diagnosis_date: Option<NaiveDate>,
    pub birth_date: Option<NaiveDate>,
    pub last_contact_date: Option<NaiveDate>,
    pub site: Option<SiteCode>,
    pub behavior: Option<BehaviorCode>,
    pub sex: Option<Sex>,
    pub vital_status: VitalStatus,
    pub cause_of_death: Option<CauseOfDeath>,
    /// Whole years between birth and diagnosis, filled by the derived-field stage.
    pub age_at_diagnosis: Option<i32>,
    /// Days between diagnosis and last contact, filled by the derived-field stage.
    pub survival_days: Option<i64>,
    pub retained: BTreeMap<String, String>,
}

impl TumorRecord {
    /// An empty record with every optional field missing.
    pub fn empty() -> Self {
        Self {
            person_id: None,
            region: None,
            diagnosis_date: None,
            birth_date: None,
            last_contact_date: None,
            site: None,
            behavior: None,
            sex: None,
            vital_status: VitalStatus::Alive,
            cause_of_death: None,
            age_at_diagnosis: None,
            survival_days: None,
            retained: BTreeMap::new(),
        }
    }
}

fn parse_date_part<T: std::str::FromStr>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    let int = match trimmed.split_once('.') {
        Some((int, frac)) if frac.chars().all(|ch| ch == '0') => int,
        Some(_) => return None,
        None => trimmed,
    };
    int.parse().ok()
}

/// One death registration with typed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MortalityRecord {
    pub person_id: Option<PersonId>,
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub primary_cause: Option<String>,
}

impl MortalityRecord {
    pub fn from_raw(raw: &RawMortalityRow) -> Self {
        let cause = raw.primary_cause.trim();
        Self {
            person_id: PersonId::parse(&raw.person_id),
            day: parse_date_part(&raw.day),
            month: parse_date_part(&raw.month),
            year: parse_date_part(&raw.year),
            primary_cause: (!cause.is_empty()).then(|| cause.to_ascii_uppercase()),
        }
    }

    /// Composes the death date; any non-calendar combination is absent.
    pub fn death_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }
}

/// A tumor record enriched with the outcome of mortality linkage.
///
/// Vital status, cause of death and death date are set together by the
/// constructors so that cause and death date are both absent exactly when
/// the patient is alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedRecord {
    /// Tumor record whose `vital_status`, `cause_of_death` and
    /// `last_contact_date` carry the linkage outcome.
    pub record: TumorRecord,
    pub death_date: Option<NaiveDate>,
    pub primary_cause: Option<String>,
}

impl LinkedRecord {
    /// No usable death registration: alive, censored at the existing last
    /// contact or at `cutoff` when none was recorded.
    pub fn alive(mut record: TumorRecord, cutoff: NaiveDate) -> Self {
        record.vital_status = VitalStatus::Alive;
        record.cause_of_death = None;
        record.last_contact_date = Some(record.last_contact_date.unwrap_or(cutoff));
        Self {
            record,
            death_date: None,
            primary_cause: None,
        }
    }

    /// Matched death registration with a usable death date.
    pub fn dead(
        mut record: TumorRecord,
        death_date: NaiveDate,
        primary_cause: Option<String>,
        cancer_prefix: &str,
    ) -> Self {
        let is_cancer = primary_cause
            .as_deref()
            .is_some_and(|code| !cancer_prefix.is_empty() && code.starts_with(cancer_prefix));
        record.vital_status = VitalStatus::Dead;
        record.cause_of_death = Some(if is_cancer {
            CauseOfDeath::Cancer
        } else {
            CauseOfDeath::Other
        });
        record.last_contact_date = Some(death_date);
        Self {
            record,
            death_date: Some(death_date),
            primary_cause,
        }
    }

    /// Rebuilds a linked record from an exported linked-stage row.
    ///
    /// A row whose status and cause disagree is treated as alive.
    pub fn restore(
        record: TumorRecord,
        death_date: Option<NaiveDate>,
        primary_cause: Option<String>,
        cutoff: NaiveDate,
    ) -> Self {
        match (record.vital_status, record.cause_of_death, death_date) {
            (VitalStatus::Dead, Some(cause), Some(date)) => {
                let mut record = record;
                record.cause_of_death = Some(cause);
                record.last_contact_date = Some(date);
                Self {
                    record,
                    death_date: Some(date),
                    primary_cause,
                }
            }
            _ => Self::alive(record, cutoff),
        }
    }

    pub fn vital_status(&self) -> VitalStatus {
        self.record.vital_status
    }

    pub fn cause_of_death(&self) -> Option<CauseOfDeath> {
        self.record.cause_of_death
    }

    /// Death date when dead, otherwise last contact or the cutoff.
    pub fn effective_last_contact(&self) -> Option<NaiveDate> {
        self.record.last_contact_date
    }

    /// Vital status, cause of death and death date agree with each other.
    pub fn is_consistent(&self) -> bool {
        match self.record.vital_status {
            VitalStatus::Alive => self.record.cause_of_death.is_none() && self.death_date.is_none(),
            VitalStatus::Dead => self.record.cause_of_death.is_some() && self.death_date.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn death_date_requires_calendar_combination() {
        let raw = RawMortalityRow {
            person_id: "1".into(),
            day: "31".into(),
            month: "2".into(),
            year: "2018".into(),
            primary_cause: "c349".into(),
        };
        let record = MortalityRecord::from_raw(&raw);
        assert_eq!(record.death_date(), None);
        assert_eq!(record.primary_cause.as_deref(), Some("C349"));

        let raw = RawMortalityRow {
            day: "05.0".into(),
            month: "03".into(),
            ..raw
        };
        assert_eq!(MortalityRecord::from_raw(&raw).death_date(), Some(date(2018, 3, 5)));
    }

    #[test]
    fn alive_keeps_existing_last_contact() {
        let mut record = TumorRecord::empty();
        record.last_contact_date = Some(date(2017, 1, 1));
        let linked = LinkedRecord::alive(record, date(2019, 12, 31));
        assert_eq!(linked.effective_last_contact(), Some(date(2017, 1, 1)));
        assert!(linked.is_consistent());

        let linked = LinkedRecord::alive(TumorRecord::empty(), date(2019, 12, 31));
        assert_eq!(linked.effective_last_contact(), Some(date(2019, 12, 31)));
    }

    #[test]
    fn dead_classifies_cause() {
        let cancer = LinkedRecord::dead(
            TumorRecord::empty(),
            date(2018, 1, 1),
            Some("C349".into()),
            "C",
        );
        assert_eq!(cancer.cause_of_death(), Some(CauseOfDeath::Cancer));
        assert!(cancer.is_consistent());

        let other = LinkedRecord::dead(TumorRecord::empty(), date(2018, 1, 1), None, "C");
        assert_eq!(other.cause_of_death(), Some(CauseOfDeath::Other));
        assert_eq!(other.effective_last_contact(), Some(date(2018, 1, 1)));
    }

    #[test]
    fn restore_rejects_inconsistent_rows() {
        let mut record = TumorRecord::empty();
        record.vital_status = VitalStatus::Dead;
        let restored = LinkedRecord::restore(record, None, None, date(2019, 12, 31));
        assert_eq!(restored.vital_status(), VitalStatus::Alive);
        assert!(restored.is_consistent());
    }
}
