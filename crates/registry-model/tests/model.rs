use chrono::NaiveDate;
use registry_model::{
    ColumnLookup, LinkedRecord, StratumKey, SurvivalObservation, TimeUnit, TumorRecord,
};

#[test]
fn time_unit_conversion() {
    assert!((TimeUnit::Years.from_days(365) - 365.0 / 365.25).abs() < 1e-12);
    assert!((TimeUnit::Days.from_days(151) - 151.0).abs() < 1e-12);
    assert_eq!(TimeUnit::default(), TimeUnit::Years);
}

#[test]
fn column_lookup_is_case_insensitive() {
    let lookup = ColumnLookup::new(["Rut", "FECDIAG", " top "]);
    assert_eq!(lookup.get("RUT"), Some("Rut"));
    assert_eq!(lookup.get("fecdiag"), Some("FECDIAG"));
    assert_eq!(lookup.get("TOP"), Some(" top "));
    assert!(!lookup.contains("SEXO"));
}

#[test]
fn observation_serializes_unit_explicitly() {
    let observation = SurvivalObservation {
        person_id: None,
        duration: 1.5,
        unit: TimeUnit::Years,
        event: true,
        key: StratumKey {
            group: "Lung".to_string(),
            region: None,
            sex: None,
        },
    };
    let json = serde_json::to_value(&observation).unwrap();
    assert_eq!(json["unit"], "years");
    assert_eq!(json["event"], true);
}

#[test]
fn linked_record_roundtrips_through_json() {
    let cutoff = NaiveDate::from_ymd_opt(2019, 12, 31).unwrap();
    let linked = LinkedRecord::alive(TumorRecord::empty(), cutoff);
    let json = serde_json::to_string(&linked).unwrap();
    let back: LinkedRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, linked);
}
