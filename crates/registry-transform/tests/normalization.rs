//! Normalization and derived-field properties.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use registry_model::{RawTumorRow, TumorRecord};
use registry_transform::{
    age_at, derive_fields, encode_date, format_date, normalize_tumor_row, parse_registry_date,
};

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1900i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn raw_row_strategy() -> impl Strategy<Value = RawTumorRow> {
    (
        "[0-9. -]{0,12}[0-9Kk]?",
        "[0-9]{0,5}(\\.0)?",
        prop_oneof!["[0-9]{8}", "[0-9]{4}-[0-9]{2}-[0-9]{2}", ".{0,10}"],
        prop_oneof!["[0-9]{8}", ".{0,10}"],
        prop_oneof!["[0-9]{8}", Just(String::new())],
        "C?[0-9]{1,3}(\\.[0-9])?",
        "[0-9](\\.0)?",
        "[0-3]?",
        "[0-3]?",
        "[0-3]?",
    )
        .prop_map(
            |(
                person_id,
                region,
                diagnosis_date,
                birth_date,
                last_contact_date,
                site,
                behavior,
                sex,
                vital_status,
                cause_of_death,
            )| RawTumorRow {
                person_id,
                region,
                diagnosis_date,
                birth_date,
                last_contact_date,
                site,
                behavior,
                sex,
                vital_status,
                cause_of_death,
                retained: Default::default(),
            },
        )
}

fn opt_date(value: Option<NaiveDate>) -> String {
    value.map(format_date).unwrap_or_default()
}

/// Re-encodes a normalized record the way stage tables store it.
fn reencode(record: &TumorRecord) -> RawTumorRow {
    RawTumorRow {
        person_id: record
            .person_id
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default(),
        region: record
            .region
            .as_ref()
            .map(|code| code.as_str().to_string())
            .unwrap_or_default(),
        diagnosis_date: opt_date(record.diagnosis_date),
        birth_date: opt_date(record.birth_date),
        last_contact_date: opt_date(record.last_contact_date),
        site: record
            .site
            .as_ref()
            .map(|code| code.as_str().to_string())
            .unwrap_or_default(),
        behavior: record
            .behavior
            .map(|code| code.code().to_string())
            .unwrap_or_default(),
        sex: record.sex.map(|sex| sex.code().to_string()).unwrap_or_default(),
        vital_status: record.vital_status.code().to_string(),
        cause_of_death: record
            .cause_of_death
            .map(|cause| cause.code().to_string())
            .unwrap_or_default(),
        retained: record.retained.clone(),
    }
}

proptest! {
    #[test]
    fn valid_dates_decode_from_both_encodings(date in date_strategy()) {
        prop_assert_eq!(parse_registry_date(&encode_date(date)), Some(date));
        prop_assert_eq!(parse_registry_date(&format_date(date)), Some(date));
    }

    #[test]
    fn arbitrary_text_never_panics(raw in ".*") {
        let _ = parse_registry_date(&raw);
    }

    #[test]
    fn normalization_is_idempotent(raw in raw_row_strategy()) {
        let once = normalize_tumor_row(&raw);
        let twice = normalize_tumor_row(&reencode(&once));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn age_matches_birthday_rule(birth in date_strategy(), diagnosis in date_strategy()) {
        let age = age_at(birth, diagnosis);
        if diagnosis < birth {
            prop_assert_eq!(age, None);
        } else {
            let age = age.unwrap();
            let had_birthday =
                (diagnosis.month(), diagnosis.day()) >= (birth.month(), birth.day());
            let expected = diagnosis.year() - birth.year() - i32::from(!had_birthday);
            prop_assert_eq!(age, expected);
            prop_assert_eq!(age_at(birth, diagnosis), Some(age));
        }
    }
}

#[test]
fn derived_fields_follow_normalized_dates() {
    let raw = RawTumorRow {
        person_id: "101".into(),
        diagnosis_date: "20150601".into(),
        birth_date: "19750601".into(),
        last_contact_date: "2016-06-01".into(),
        site: "339".into(),
        behavior: "3".into(),
        sex: "2".into(),
        ..RawTumorRow::default()
    };
    let table = derive_fields(&[normalize_tumor_row(&raw)]);
    let record = &table.records[0];
    assert_eq!(record.age_at_diagnosis, Some(40));
    assert_eq!(record.survival_days, Some(366));
}
