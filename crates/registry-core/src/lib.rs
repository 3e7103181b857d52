//! Registry pipeline core.
//!
//! The stages after field normalization:
//!
//! - **cohort**: composable inclusion predicates with per-step counts
//! - **linkage**: mortality linkage, vital status and cause of death
//! - **survival**: (duration, event) observations with stratification keys
//! - **strata**: partition-and-dispatch over tumor groups and strata
//! - **pipeline**: the stages chained in memory

pub mod cohort;
pub mod error;
pub mod linkage;
pub mod pipeline;
pub mod strata;
pub mod survival;

pub use cohort::{
    CohortPredicate, FilterReport, FilterStep, FilteredCohort, apply_filters, standard_predicates,
};
pub use error::{LinkageError, Result};
pub use linkage::{LinkOutcome, LinkageReport, link};
pub use pipeline::{
    CohortStage, PipelineOutput, PipelineSettings, StageReports, mortality_records,
    prepare_cohort, run_pipeline,
};
pub use strata::{
    CurveEstimator, DriverFailure, DriverReport, Figure, FigureSink, LabeledCurve, StrataDriver,
    Stratum,
};
pub use survival::{Exclusion, SurvivalDataset, SurvivalReport, build_observations, observation_for};
