//! End-to-end stage behavior.

use std::collections::BTreeSet;
use std::convert::Infallible;

use chrono::NaiveDate;
use registry_core::{
    CurveEstimator, Figure, FigureSink, PipelineSettings, StrataDriver, run_pipeline,
    standard_predicates,
};
use registry_model::{
    CauseOfDeath, LinkageOptions, RawMortalityRow, RawTumorRow, RegionCode, SiteCode,
    StrataDimension, TimeUnit, TumorGroup, TumorGroups, VitalStatus,
};
use registry_transform::elapsed_days;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn tumor(id: &str, birth: &str, region: &str, sex: &str, site: &str) -> RawTumorRow {
    RawTumorRow {
        person_id: id.into(),
        region: region.into(),
        diagnosis_date: "20150601".into(),
        birth_date: birth.into(),
        last_contact_date: String::new(),
        site: site.into(),
        behavior: "3".into(),
        sex: sex.into(),
        ..RawTumorRow::default()
    }
}

fn site_codes(raw: &[&str]) -> BTreeSet<SiteCode> {
    raw.iter().filter_map(|code| SiteCode::parse(code)).collect()
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        predicates: standard_predicates(site_codes(&["339", "340"]), 15, 2011..=2019),
        linkage: LinkageOptions::default(),
        groups: TumorGroups::new(vec![TumorGroup::new(
            "Lung",
            site_codes(&["33.9", "340"]),
        )]),
        time_unit: TimeUnit::Days,
    }
}

#[test]
fn linked_death_and_censored_survivor() {
    let tumors = vec![
        tumor("101", "19750601", "2101", "1", "339"),
        tumor("102", "19450601", "2201", "2", "339"),
    ];
    let deaths = vec![RawMortalityRow {
        person_id: "101".into(),
        day: "5".into(),
        month: "3".into(),
        year: "2018".into(),
        primary_cause: "C340".into(),
    }];

    let output = run_pipeline(&tumors, &deaths, &settings()).unwrap();

    let ages: Vec<_> = output
        .cohort
        .records
        .iter()
        .map(|record| record.age_at_diagnosis)
        .collect();
    assert_eq!(ages, vec![Some(40), Some(70)]);

    let first = &output.linked.records[0];
    assert_eq!(first.vital_status(), VitalStatus::Dead);
    assert_eq!(first.cause_of_death(), Some(CauseOfDeath::Cancer));
    let second = &output.linked.records[1];
    assert_eq!(second.vital_status(), VitalStatus::Alive);
    assert_eq!(second.cause_of_death(), None);

    let observations = &output.survival.observations;
    assert_eq!(observations.len(), 2);
    assert!(observations[0].event);
    assert_eq!(
        observations[0].duration,
        elapsed_days(date(2015, 6, 1), date(2018, 3, 5)) as f64
    );
    assert!(!observations[1].event);
    assert_eq!(
        observations[1].duration,
        elapsed_days(date(2015, 6, 1), date(2019, 12, 31)) as f64
    );
    assert_eq!(observations[1].key.group, "Lung");
    assert_eq!(output.reports.linkage.matched, 1);
    assert_eq!(output.reports.survival.events, 1);
}

#[test]
fn negative_duration_never_reaches_estimation() {
    let mut row = tumor("101", "19750601", "2101", "1", "339");
    row.last_contact_date = "20150101".into();
    let output = run_pipeline(&[row], &[], &settings()).unwrap();

    assert_eq!(output.linked.records.len(), 1);
    assert!(output.survival.observations.is_empty());
    assert_eq!(output.reports.survival.negative_duration, 1);
}

/// Records the label and sample count of every estimation.
struct CountingEstimator;

impl CurveEstimator for CountingEstimator {
    type Curve = usize;
    type Error = Infallible;

    fn estimate(&self, _label: &str, samples: &[(f64, bool)]) -> Result<usize, Infallible> {
        Ok(samples.len())
    }
}

#[derive(Default)]
struct CollectingSink {
    figures: Vec<(String, Vec<(String, usize)>)>,
}

impl FigureSink<usize> for CollectingSink {
    type Error = Infallible;

    fn accept(&mut self, figure: &Figure<usize>) -> Result<(), Infallible> {
        self.figures.push((
            figure.title.clone(),
            figure
                .curves
                .iter()
                .map(|curve| (curve.label.clone(), curve.curve))
                .collect(),
        ));
        Ok(())
    }
}

#[test]
fn driver_partitions_and_skips_empty_strata() {
    let tumors = vec![
        tumor("1", "19600101", "2101", "1", "339"),
        tumor("2", "19600101", "2101", "2", "340"),
        tumor("3", "19600101", "2201", "1", "339"),
    ];
    let settings = settings();
    let output = run_pipeline(&tumors, &[], &settings).unwrap();

    let regions = vec![
        RegionCode::parse("2101").unwrap(),
        RegionCode::parse("2201").unwrap(),
    ];
    let driver = StrataDriver::new(&settings.groups, &StrataDimension::ALL, &regions);
    let mut sink = CollectingSink::default();
    let report = driver.run(
        &output.survival.observations,
        TimeUnit::Days,
        &CountingEstimator,
        &mut sink,
    );

    assert_eq!(report.figures, 4);
    assert_eq!(report.empty_partitions, vec!["Lung - Region 2201, Female".to_string()]);
    assert!(report.failures.is_empty());
    assert_eq!(sink.figures[0].1, vec![("All patients".to_string(), 3)]);
    assert_eq!(
        sink.figures[1].1,
        vec![
            ("Region 2101".to_string(), 2),
            ("Region 2201".to_string(), 1)
        ]
    );
    assert_eq!(
        sink.figures[2].1,
        vec![("Male".to_string(), 2), ("Female".to_string(), 1)]
    );
    assert_eq!(sink.figures[3].1.len(), 3);
    assert_eq!(report.curves, 1 + 2 + 2 + 3);
}

#[test]
fn driver_uses_observed_regions_when_none_configured() {
    let tumors = vec![
        tumor("1", "19600101", "2201", "1", "339"),
        tumor("2", "19600101", "13101", "2", "340"),
    ];
    let settings = settings();
    let output = run_pipeline(&tumors, &[], &settings).unwrap();

    let driver = StrataDriver::new(&settings.groups, &[StrataDimension::Region], &[]);
    let mut sink = CollectingSink::default();
    driver.run(
        &output.survival.observations,
        TimeUnit::Days,
        &CountingEstimator,
        &mut sink,
    );
    let labels: Vec<_> = sink.figures[0].1.iter().map(|(label, _)| label.as_str()).collect();
    assert_eq!(labels, vec!["Region 13101", "Region 2201"]);
}
