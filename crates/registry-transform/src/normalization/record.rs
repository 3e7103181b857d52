//! Raw tumor rows to typed tumor records.

use serde::Serialize;
use tracing::{debug, info};

use registry_model::{
    BehaviorCode, CauseOfDeath, PersonId, RawTumorRow, RegionCode, Sex, SiteCode, TumorRecord,
    VitalStatus,
};

use super::date::parse_registry_date;

/// Count of source values that resolved to missing, per field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub rows: usize,
    pub missing_person_id: usize,
    pub missing_region: usize,
    pub missing_diagnosis_date: usize,
    pub missing_birth_date: usize,
    pub missing_last_contact_date: usize,
    pub missing_site: usize,
    pub missing_behavior: usize,
    pub missing_sex: usize,
}

impl NormalizationReport {
    fn record(&mut self, record: &TumorRecord) {
        self.rows += 1;
        self.missing_person_id += usize::from(record.person_id.is_none());
        self.missing_region += usize::from(record.region.is_none());
        self.missing_diagnosis_date += usize::from(record.diagnosis_date.is_none());
        self.missing_birth_date += usize::from(record.birth_date.is_none());
        self.missing_last_contact_date += usize::from(record.last_contact_date.is_none());
        self.missing_site += usize::from(record.site.is_none());
        self.missing_behavior += usize::from(record.behavior.is_none());
        self.missing_sex += usize::from(record.sex.is_none());
    }
}

/// Output of the normalization stage.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub records: Vec<TumorRecord>,
    pub report: NormalizationReport,
}

/// Normalize one raw row. Malformed values become `None`; nothing fails.
///
/// Derived fields are left empty for the derived-field stage.
pub fn normalize_tumor_row(raw: &RawTumorRow) -> TumorRecord {
    if SiteCode::has_ambiguous_fraction(&raw.site) {
        debug!(site = %raw.site, "site code with a zero fraction is read as an integer");
    }
    TumorRecord {
        person_id: PersonId::parse(&raw.person_id),
        region: RegionCode::parse(&raw.region),
        diagnosis_date: parse_registry_date(&raw.diagnosis_date),
        birth_date: parse_registry_date(&raw.birth_date),
        last_contact_date: parse_registry_date(&raw.last_contact_date),
        site: SiteCode::parse(&raw.site),
        behavior: BehaviorCode::parse(&raw.behavior),
        sex: Sex::from_code(&raw.sex),
        vital_status: VitalStatus::from_code(&raw.vital_status),
        cause_of_death: CauseOfDeath::from_code(&raw.cause_of_death),
        age_at_diagnosis: None,
        survival_days: None,
        retained: raw.retained.clone(),
    }
}

/// Normalize every raw row, counting values that resolved to missing.
pub fn normalize_tumor_rows(rows: &[RawTumorRow]) -> NormalizedTable {
    let mut report = NormalizationReport::default();
    let records: Vec<TumorRecord> = rows
        .iter()
        .map(|raw| {
            let record = normalize_tumor_row(raw);
            report.record(&record);
            record
        })
        .collect();
    if report.missing_diagnosis_date > 0 || report.missing_birth_date > 0 {
        debug!(
            missing_diagnosis_date = report.missing_diagnosis_date,
            missing_birth_date = report.missing_birth_date,
            missing_last_contact_date = report.missing_last_contact_date,
            "malformed dates resolved to missing"
        );
    }
    info!(
        stage = "normalize",
        rows = report.rows,
        missing_site = report.missing_site,
        missing_person_id = report.missing_person_id,
        "normalization complete"
    );
    NormalizedTable { records, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw() -> RawTumorRow {
        RawTumorRow {
            person_id: "12345678-9".into(),
            region: "2201".into(),
            diagnosis_date: "20150601".into(),
            birth_date: "19750315".into(),
            last_contact_date: "".into(),
            site: "33.9".into(),
            behavior: "3".into(),
            sex: "1".into(),
            vital_status: "".into(),
            cause_of_death: "".into(),
            retained: [("MORF".to_string(), "8140".to_string())].into(),
        }
    }

    #[test]
    fn normalizes_codes_and_dates() {
        let record = normalize_tumor_row(&raw());
        assert_eq!(record.site.as_ref().map(SiteCode::as_str), Some("339"));
        assert_eq!(
            record.diagnosis_date,
            NaiveDate::from_ymd_opt(2015, 6, 1)
        );
        assert_eq!(record.last_contact_date, None);
        assert_eq!(record.sex, Some(Sex::Male));
        assert!(record.behavior.unwrap().is_malignant());
        assert_eq!(record.vital_status, VitalStatus::Alive);
        assert_eq!(record.retained.get("MORF").map(String::as_str), Some("8140"));
    }

    #[test]
    fn report_counts_missing_values() {
        let mut bad = raw();
        bad.diagnosis_date = "20151340".into();
        bad.site = "lung".into();
        let table = normalize_tumor_rows(&[raw(), bad]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.report.rows, 2);
        assert_eq!(table.report.missing_diagnosis_date, 1);
        assert_eq!(table.report.missing_site, 1);
        assert_eq!(table.report.missing_last_contact_date, 2);
    }
}
