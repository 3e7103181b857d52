use std::path::PathBuf;

use registry_core::{DriverReport, StageReports};
use registry_ingest::SkippedFile;
use registry_report::CaseTabulation;

/// One row of the stage summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: String,
    pub input: usize,
    pub output: usize,
    pub note: String,
}

impl StageSummary {
    pub fn new(
        stage: impl Into<String>,
        input: usize,
        output: usize,
        note: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            input,
            output,
            note: note.into(),
        }
    }
}

/// Everything a command did, for the terminal summary and the run manifest.
#[derive(Debug, Default)]
pub struct CommandResult {
    pub command: &'static str,
    pub inputs: Vec<PathBuf>,
    pub stages: Vec<StageSummary>,
    pub reports: Option<StageReports>,
    pub curves: Option<DriverReport>,
    pub tabulation: Option<CaseTabulation>,
    pub skipped_files: Vec<SkippedFile>,
    pub artifacts: Vec<PathBuf>,
    pub manifest: Option<PathBuf>,
    /// Failed export steps; the remaining steps still ran.
    pub errors: Vec<String>,
}

impl CommandResult {
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
