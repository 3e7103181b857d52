//! Stratified curve driver.
//!
//! Partitions the observation set by tumor group and strata dimension and
//! dispatches each non-empty partition to a [`CurveEstimator`]. The curves
//! of one (group, dimension) pair form a [`Figure`] handed to a
//! [`FigureSink`]. No curve fitting happens here.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use registry_model::{
    RegionCode, Sex, StrataDimension, SurvivalObservation, TimeUnit, TumorGroups,
};

/// Estimates a survival curve from (duration, event) samples.
pub trait CurveEstimator {
    type Curve;
    type Error: std::fmt::Display;

    fn estimate(&self, label: &str, samples: &[(f64, bool)]) -> Result<Self::Curve, Self::Error>;
}

/// Consumes the figures produced by the driver (renders, exports).
pub trait FigureSink<C> {
    type Error: std::fmt::Display;

    fn accept(&mut self, figure: &Figure<C>) -> Result<(), Self::Error>;
}

/// One stratum of a figure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Stratum {
    pub region: Option<RegionCode>,
    pub sex: Option<Sex>,
}

impl Stratum {
    pub fn label(&self) -> String {
        match (&self.region, self.sex) {
            (None, None) => "All patients".to_string(),
            (Some(region), None) => format!("Region {region}"),
            (None, Some(sex)) => sex.label().to_string(),
            (Some(region), Some(sex)) => format!("Region {region}, {}", sex.label()),
        }
    }

    fn matches(&self, observation: &SurvivalObservation) -> bool {
        self.region
            .as_ref()
            .is_none_or(|region| observation.key.region.as_ref() == Some(region))
            && self.sex.is_none_or(|sex| observation.key.sex == Some(sex))
    }
}

#[derive(Debug, Clone)]
pub struct LabeledCurve<C> {
    pub stratum: Stratum,
    pub label: String,
    pub observations: usize,
    pub events: usize,
    pub curve: C,
}

/// All curves of one tumor group under one strata dimension.
#[derive(Debug, Clone)]
pub struct Figure<C> {
    pub group: String,
    pub dimension: StrataDimension,
    pub title: String,
    pub unit: TimeUnit,
    pub curves: Vec<LabeledCurve<C>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverFailure {
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverReport {
    pub curves: usize,
    pub figures: usize,
    /// Partition labels that held no observation.
    pub empty_partitions: Vec<String>,
    pub failures: Vec<DriverFailure>,
}

/// Drives estimation over tumor groups × strata dimensions.
#[derive(Debug, Clone)]
pub struct StrataDriver<'a> {
    groups: &'a TumorGroups,
    dimensions: &'a [StrataDimension],
    regions: &'a [RegionCode],
}

impl<'a> StrataDriver<'a> {
    /// `regions` lists the regions compared by the region strata; when empty,
    /// every region observed in the group is used.
    pub fn new(
        groups: &'a TumorGroups,
        dimensions: &'a [StrataDimension],
        regions: &'a [RegionCode],
    ) -> Self {
        Self {
            groups,
            dimensions,
            regions,
        }
    }

    fn regions_for(&self, observations: &[&SurvivalObservation]) -> Vec<RegionCode> {
        if !self.regions.is_empty() {
            return self.regions.to_vec();
        }
        observations
            .iter()
            .filter_map(|obs| obs.key.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Strata of one dimension, in presentation order.
    pub fn strata(
        &self,
        dimension: StrataDimension,
        observations: &[&SurvivalObservation],
    ) -> Vec<Stratum> {
        let regions = || self.regions_for(observations);
        match dimension {
            StrataDimension::None => vec![Stratum {
                region: None,
                sex: None,
            }],
            StrataDimension::Region => regions()
                .into_iter()
                .map(|region| Stratum {
                    region: Some(region),
                    sex: None,
                })
                .collect(),
            StrataDimension::Sex => Sex::ALL
                .into_iter()
                .map(|sex| Stratum {
                    region: None,
                    sex: Some(sex),
                })
                .collect(),
            StrataDimension::RegionSex => regions()
                .into_iter()
                .flat_map(|region| {
                    Sex::ALL.into_iter().map(move |sex| Stratum {
                        region: Some(region.clone()),
                        sex: Some(sex),
                    })
                })
                .collect(),
        }
    }

    /// Estimates every non-empty partition and hands each figure to `sink`.
    ///
    /// Empty partitions and failing estimations or sinks are reported and
    /// skipped; the remaining partitions are still processed.
    pub fn run<E, S>(
        &self,
        observations: &[SurvivalObservation],
        unit: TimeUnit,
        estimator: &E,
        sink: &mut S,
    ) -> DriverReport
    where
        E: CurveEstimator,
        S: FigureSink<E::Curve>,
    {
        let mut report = DriverReport::default();

        for group in self.groups.iter() {
            let _span = info_span!("group", group = %group.name).entered();
            let members: Vec<&SurvivalObservation> = observations
                .iter()
                .filter(|obs| obs.key.group == group.name)
                .collect();
            if members.is_empty() {
                warn!(group = %group.name, "no observations for tumor group");
            }

            for &dimension in self.dimensions {
                let mut figure = Figure {
                    group: group.name.clone(),
                    dimension,
                    title: format!("{}: {}", group.name, dimension.title()),
                    unit,
                    curves: Vec::new(),
                };

                for stratum in self.strata(dimension, &members) {
                    let label = format!("{} - {}", group.name, stratum.label());
                    let samples: Vec<(f64, bool)> = members
                        .iter()
                        .filter(|obs| stratum.matches(obs))
                        .map(|obs| (obs.duration, obs.event))
                        .collect();
                    if samples.is_empty() {
                        debug!(label = %label, "empty partition skipped");
                        report.empty_partitions.push(label);
                        continue;
                    }
                    match estimator.estimate(&label, &samples) {
                        Ok(curve) => {
                            report.curves += 1;
                            figure.curves.push(LabeledCurve {
                                label: stratum.label(),
                                stratum,
                                observations: samples.len(),
                                events: samples.iter().filter(|(_, event)| *event).count(),
                                curve,
                            });
                        }
                        Err(err) => {
                            warn!(label = %label, error = %err, "curve estimation failed");
                            report.failures.push(DriverFailure {
                                label,
                                reason: err.to_string(),
                            });
                        }
                    }
                }

                if figure.curves.is_empty() {
                    continue;
                }
                match sink.accept(&figure) {
                    Ok(()) => report.figures += 1,
                    Err(err) => {
                        warn!(figure = %figure.title, error = %err, "figure output failed");
                        report.failures.push(DriverFailure {
                            label: figure.title.clone(),
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            stage = "curves",
            curves = report.curves,
            figures = report.figures,
            empty = report.empty_partitions.len(),
            failures = report.failures.len(),
            "curve driver finished"
        );
        report
    }
}
