//! In-memory pipeline: normalize, derive, filter, link, build observations.
//!
//! Each stage takes the previous stage's output by reference and returns a
//! new owned table together with its report.

use serde::Serialize;
use tracing::info_span;

use registry_model::{
    LinkageOptions, MortalityRecord, RawMortalityRow, RawTumorRow, TimeUnit, TumorGroups,
};
use registry_transform::{DeriveReport, NormalizationReport, derive_fields, normalize_tumor_rows};

use crate::cohort::{CohortPredicate, FilterReport, FilteredCohort, apply_filters};
use crate::error::Result;
use crate::linkage::{LinkOutcome, LinkageReport, link};
use crate::survival::{SurvivalDataset, SurvivalReport, build_observations};

/// Settings shared by the in-memory stages.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub predicates: Vec<CohortPredicate>,
    pub linkage: LinkageOptions,
    pub groups: TumorGroups,
    pub time_unit: TimeUnit,
}

/// Output of the cohort stages (normalize, derive, filter).
#[derive(Debug, Clone)]
pub struct CohortStage {
    pub normalization: NormalizationReport,
    pub derive: DeriveReport,
    pub cohort: FilteredCohort,
}

/// Normalizes raw tumor rows, derives age and survival days, and filters.
pub fn prepare_cohort(rows: &[RawTumorRow], predicates: &[CohortPredicate]) -> CohortStage {
    let normalized = {
        let _span = info_span!("normalize").entered();
        normalize_tumor_rows(rows)
    };
    let derived = {
        let _span = info_span!("derive").entered();
        derive_fields(&normalized.records)
    };
    let cohort = {
        let _span = info_span!("cohort").entered();
        apply_filters(&derived.records, predicates)
    };
    CohortStage {
        normalization: normalized.report,
        derive: derived.report,
        cohort,
    }
}

/// Types raw mortality rows.
pub fn mortality_records(rows: &[RawMortalityRow]) -> Vec<MortalityRecord> {
    rows.iter().map(MortalityRecord::from_raw).collect()
}

/// Counts of every stage, for summaries and the run manifest.
#[derive(Debug, Clone, Serialize)]
pub struct StageReports {
    pub normalization: NormalizationReport,
    pub derive: DeriveReport,
    pub cohort: FilterReport,
    pub linkage: LinkageReport,
    pub survival: SurvivalReport,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub cohort: FilteredCohort,
    pub linked: LinkOutcome,
    pub survival: SurvivalDataset,
    pub reports: StageReports,
}

/// Runs every stage up to the survival dataset.
pub fn run_pipeline(
    tumors: &[RawTumorRow],
    mortality: &[RawMortalityRow],
    settings: &PipelineSettings,
) -> Result<PipelineOutput> {
    let stage = prepare_cohort(tumors, &settings.predicates);
    let deaths = mortality_records(mortality);
    let linked = {
        let _span = info_span!("link").entered();
        link(&stage.cohort.records, &deaths, &settings.linkage)?
    };
    let survival = {
        let _span = info_span!("survival").entered();
        build_observations(&linked.records, &settings.groups, settings.time_unit)
    };
    let reports = StageReports {
        normalization: stage.normalization,
        derive: stage.derive,
        cohort: stage.cohort.report.clone(),
        linkage: linked.report.clone(),
        survival: survival.report.clone(),
    };
    Ok(PipelineOutput {
        cohort: stage.cohort,
        linked,
        survival,
        reports,
    })
}
