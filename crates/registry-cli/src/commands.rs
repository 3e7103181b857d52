//! Command implementations.
//!
//! Unreadable inputs abort a command. Export steps are independent: a
//! failing step is logged and recorded in [`CommandResult::errors`], and the
//! remaining steps still run.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, error, info, info_span, warn};

use registry_config::{RegistryConfig, load_config_or_default};
use registry_core::{
    CohortPredicate, FilterReport, LinkageReport, PipelineSettings, StageReports, StrataDriver,
    SurvivalReport, build_observations, link, mortality_records, prepare_cohort, run_pipeline,
    standard_predicates,
};
use registry_ingest::{
    MortalitySource, linked_frame, linked_rows_from_frame, load_mortality_source, mortality_frame,
    read_table, tumor_frame, tumor_rows_from_frame, write_csv_table,
};
use registry_model::{
    LinkedRecord, RawTumorRow, RegionCode, SurvivalObservation, TimeUnit, TumorGroups,
    TumorRecord,
};
use registry_report::{DirectoryFigureSink, KaplanMeier, tabulate_cases, write_tabulation_csv};
use registry_transform::{
    DeriveReport, NormalizationReport, derive_fields, normalize_tumor_rows, parse_registry_date,
};

use crate::cli::{CohortArgs, CurvesArgs, DeathsArgs, DescribeArgs, LinkArgs, RunArgs};
use crate::logging::redact_value;
use crate::manifest::{
    MANIFEST_SCHEMA, MANIFEST_SCHEMA_VERSION, RunManifest, current_timestamp, describe_input,
    write_manifest,
};
use crate::summary::groups_table;
use crate::types::{CommandResult, StageSummary};

pub const MORTALITY_TABLE: &str = "mortality.csv";
pub const COHORT_TABLE: &str = "cohort.csv";
pub const LINKED_TABLE: &str = "linked.csv";
pub const CASES_TABLE: &str = "cases.csv";
pub const CURVES_DIR: &str = "curves";
pub const MANIFEST_FILE: &str = "run_manifest.json";

/// Configuration resolved into the typed values the stages take.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: RegistryConfig,
    pub predicates: Vec<CohortPredicate>,
    pub groups: TumorGroups,
    pub regions: Vec<RegionCode>,
}

impl Settings {
    /// Loads the config named by `--config`, `REGISTRY_CONFIG` or the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = load_config_or_default(explicit).context("load configuration")?;
        Self::from_config(config)
    }

    pub fn from_config(config: RegistryConfig) -> Result<Self> {
        config.validate().context("validate configuration")?;
        let site_codes = config
            .cohort
            .site_code_set()
            .context("cohort site codes")?;
        let predicates =
            standard_predicates(site_codes, config.cohort.minimum_age, config.cohort.years());
        let groups = config.survival.tumor_groups().context("tumor groups")?;
        let regions = config.survival.region_codes().context("survival regions")?;
        Ok(Self {
            config,
            predicates,
            groups,
            regions,
        })
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.config.survival.time_unit
    }

    fn pipeline(&self) -> PipelineSettings {
        PipelineSettings {
            predicates: self.predicates.clone(),
            linkage: self.config.linkage.options(),
            groups: self.groups.clone(),
            time_unit: self.time_unit(),
        }
    }
}

pub fn run_groups(settings: &Settings) {
    println!("{}", groups_table(&settings.groups));
}

pub fn run_deaths(settings: &Settings, args: &DeathsArgs) -> Result<CommandResult> {
    let _span = info_span!("deaths", input = %args.input.display()).entered();
    let mut result = CommandResult::new("deaths");
    let source = load_mortality(settings, &args.input, &mut result)?;
    result.stages.push(StageSummary::new(
        "combine",
        source.loaded.len() + source.skipped.len(),
        source.rows.len(),
        format!("{} files loaded, {} skipped", source.loaded.len(), source.skipped.len()),
    ));
    export_step(&mut result, "combined mortality table", &args.output, |path| {
        let mut df = mortality_frame(&source.rows, &settings.config.mortality_columns)?;
        write_csv_table(&mut df, path)?;
        Ok(())
    });
    Ok(result)
}

pub fn run_cohort(settings: &Settings, args: &CohortArgs) -> Result<CommandResult> {
    let _span = info_span!("cohort", input = %args.input.display()).entered();
    let mut result = CommandResult::new("cohort");
    let rows = load_tumor_rows(settings, &args.input)?;
    result.inputs.push(args.input.clone());
    let stage = prepare_cohort(&rows, &settings.predicates);
    push_cohort_summaries(
        &mut result.stages,
        &stage.normalization,
        &stage.derive,
        &stage.cohort.report,
    );
    export_step(&mut result, "adjusted cohort", &args.output, |path| {
        write_tumor_table(settings, &stage.cohort.records, path)
    });
    Ok(result)
}

pub fn run_link(settings: &Settings, args: &LinkArgs) -> Result<CommandResult> {
    let _span = info_span!("link", cohort = %args.cohort.display()).entered();
    let mut result = CommandResult::new("link");
    let cohort = load_cohort(settings, &args.cohort)?;
    result.inputs.push(args.cohort.clone());
    let source = load_mortality(settings, &args.mortality, &mut result)?;

    let deaths = mortality_records(&source.rows);
    let outcome = link(&cohort, &deaths, &settings.config.linkage.options())
        .context("link cohort with mortality")?;
    log_duplicates(&outcome.report);
    result.stages.push(linkage_summary(&outcome.report));
    export_step(&mut result, "linked cohort", &args.output, |path| {
        let mut df = linked_frame(
            &outcome.records,
            &settings.config.columns,
            &settings.config.mortality_columns,
        )?;
        write_csv_table(&mut df, path)?;
        Ok(())
    });
    Ok(result)
}

pub fn run_curves(settings: &Settings, args: &CurvesArgs) -> Result<CommandResult> {
    let _span = info_span!("curves", input = %args.input.display()).entered();
    let mut result = CommandResult::new("curves");
    let linked = load_linked(settings, &args.input)?;
    result.inputs.push(args.input.clone());
    let dataset = build_observations(&linked, &settings.groups, settings.time_unit());
    result.stages.push(survival_summary(&dataset.report));
    draw_curves(settings, &dataset.observations, &args.output_dir, &mut result);
    Ok(result)
}

pub fn run_describe(settings: &Settings, args: &DescribeArgs) -> Result<CommandResult> {
    let _span = info_span!("describe", input = %args.input.display()).entered();
    let mut result = CommandResult::new("describe");
    let records = load_cohort(settings, &args.input)?;
    result.inputs.push(args.input.clone());
    describe_cases(settings, &records, &args.output, &mut result);
    Ok(result)
}

/// Runs every stage in memory and writes each stage table, the case counts,
/// the curve figures and the run manifest into the output directory.
pub fn run_all(settings: &Settings, args: &RunArgs) -> Result<CommandResult> {
    let _span = info_span!("run", tumors = %args.tumors.display()).entered();
    let mut result = CommandResult::new("run");
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("create output directory {}", args.output_dir.display()))?;

    let tumors = load_tumor_rows(settings, &args.tumors)?;
    result.inputs.push(args.tumors.clone());
    let source = load_mortality(settings, &args.mortality, &mut result)?;

    let output = run_pipeline(&tumors, &source.rows, &settings.pipeline())
        .context("run registry pipeline")?;
    push_report_summaries(&mut result.stages, &output.reports);
    log_duplicates(&output.reports.linkage);

    let out_dir = &args.output_dir;
    if args.mortality.is_dir() {
        let path = out_dir.join(MORTALITY_TABLE);
        export_step(&mut result, "combined mortality table", &path, |path| {
            let mut df = mortality_frame(&source.rows, &settings.config.mortality_columns)?;
            write_csv_table(&mut df, path)?;
            Ok(())
        });
    }
    export_step(&mut result, "adjusted cohort", &out_dir.join(COHORT_TABLE), |path| {
        write_tumor_table(settings, &output.cohort.records, path)
    });
    export_step(&mut result, "linked cohort", &out_dir.join(LINKED_TABLE), |path| {
        let mut df = linked_frame(
            &output.linked.records,
            &settings.config.columns,
            &settings.config.mortality_columns,
        )?;
        write_csv_table(&mut df, path)?;
        Ok(())
    });
    describe_cases(settings, &output.cohort.records, &out_dir.join(CASES_TABLE), &mut result);
    draw_curves(
        settings,
        &output.survival.observations,
        &out_dir.join(CURVES_DIR),
        &mut result,
    );
    result.reports = Some(output.reports);

    let manifest_path = out_dir.join(MANIFEST_FILE);
    match write_run_manifest(settings, &result, &manifest_path) {
        Ok(()) => {
            info!(path = %manifest_path.display(), "run manifest written");
            result.manifest = Some(manifest_path);
        }
        Err(err) => {
            let message = format!("{err:#}");
            error!(path = %manifest_path.display(), error = %message, "run manifest failed");
            result.errors.push(format!("run manifest: {message}"));
        }
    }
    Ok(result)
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn load_tumor_rows(settings: &Settings, path: &Path) -> Result<Vec<RawTumorRow>> {
    let df = read_table(path).with_context(|| format!("read tumor table {}", path.display()))?;
    let rows = tumor_rows_from_frame(&df, &settings.config.columns, &source_name(path))
        .with_context(|| format!("extract tumor rows from {}", path.display()))?;
    info!(path = %path.display(), rows = rows.len(), "tumor table loaded");
    Ok(rows)
}

/// Reads an adjusted cohort table back into typed records with derived fields.
fn load_cohort(settings: &Settings, path: &Path) -> Result<Vec<TumorRecord>> {
    let rows = load_tumor_rows(settings, path)?;
    let normalized = normalize_tumor_rows(&rows);
    Ok(derive_fields(&normalized.records).records)
}

/// Reads a linked cohort table back into linked records.
fn load_linked(settings: &Settings, path: &Path) -> Result<Vec<LinkedRecord>> {
    let df = read_table(path).with_context(|| format!("read linked table {}", path.display()))?;
    let rows = linked_rows_from_frame(
        &df,
        &settings.config.columns,
        &settings.config.mortality_columns,
        &source_name(path),
    )
    .with_context(|| format!("extract linked rows from {}", path.display()))?;

    let (tumors, outcomes): (Vec<RawTumorRow>, Vec<(String, String)>) = rows
        .into_iter()
        .map(|row| (row.tumor, (row.death_date, row.primary_cause)))
        .unzip();
    let derived = derive_fields(&normalize_tumor_rows(&tumors).records);
    let cutoff = settings.config.linkage.cutoff_date;
    let linked: Vec<LinkedRecord> = derived
        .records
        .into_iter()
        .zip(outcomes)
        .map(|(record, (death_date, primary_cause))| {
            let cause = primary_cause.trim();
            LinkedRecord::restore(
                record,
                parse_registry_date(&death_date),
                (!cause.is_empty()).then(|| cause.to_string()),
                cutoff,
            )
        })
        .collect();
    let inconsistent = linked.iter().filter(|record| !record.is_consistent()).count();
    if inconsistent > 0 {
        warn!(path = %path.display(), inconsistent, "linked rows with inconsistent outcome");
    }
    info!(path = %path.display(), rows = linked.len(), "linked table loaded");
    Ok(linked)
}

fn load_mortality(
    settings: &Settings,
    path: &Path,
    result: &mut CommandResult,
) -> Result<MortalitySource> {
    let source = load_mortality_source(path, &settings.config.mortality_columns)
        .with_context(|| format!("load mortality source {}", path.display()))?;
    result
        .inputs
        .extend(source.loaded.iter().map(|file| file.path.clone()));
    result.skipped_files.extend(source.skipped.iter().cloned());
    Ok(source)
}

fn write_tumor_table(settings: &Settings, records: &[TumorRecord], path: &Path) -> Result<()> {
    let mut df = tumor_frame(records, &settings.config.columns)?;
    write_csv_table(&mut df, path)?;
    Ok(())
}

fn describe_cases(
    settings: &Settings,
    records: &[TumorRecord],
    path: &Path,
    result: &mut CommandResult,
) {
    let tabulation = tabulate_cases(
        records,
        &settings.groups,
        settings.config.cohort.minimum_age,
    );
    result.stages.push(StageSummary::new(
        "describe",
        records.len(),
        tabulation.total,
        format!("{} region/sex/group cells", tabulation.rows.len()),
    ));
    export_step(result, "case counts", path, |path| {
        write_tabulation_csv(&tabulation, path)?;
        Ok(())
    });
    result.tabulation = Some(tabulation);
}

fn draw_curves(
    settings: &Settings,
    observations: &[SurvivalObservation],
    output_dir: &Path,
    result: &mut CommandResult,
) {
    let mut sink = match DirectoryFigureSink::new(output_dir) {
        Ok(sink) => sink,
        Err(err) => {
            error!(path = %output_dir.display(), error = %err, "curve output directory unavailable");
            result.errors.push(format!("survival curves: {err}"));
            return;
        }
    };
    let driver = StrataDriver::new(
        &settings.groups,
        &settings.config.survival.strata,
        &settings.regions,
    );
    let report = driver.run(observations, settings.time_unit(), &KaplanMeier, &mut sink);
    result.artifacts.extend(sink.artifacts().iter().cloned());
    result.errors.extend(
        report
            .failures
            .iter()
            .map(|failure| format!("{}: {}", failure.label, failure.reason)),
    );
    result.curves = Some(report);
}

/// Runs one export step, recording its artifact or its failure.
fn export_step<F>(result: &mut CommandResult, step: &str, path: &Path, write: F)
where
    F: FnOnce(&Path) -> Result<()>,
{
    match write(path) {
        Ok(()) => {
            info!(step, path = %path.display(), "stage table written");
            result.artifacts.push(path.to_path_buf());
        }
        Err(err) => {
            let message = format!("{err:#}");
            error!(step, path = %path.display(), error = %message, "export step failed");
            result.errors.push(format!("{step}: {message}"));
        }
    }
}

fn write_run_manifest(settings: &Settings, result: &CommandResult, path: &Path) -> Result<()> {
    let inputs = result
        .inputs
        .iter()
        .map(|input| describe_input(input.as_path()))
        .collect::<Result<Vec<_>>>()?;
    let manifest = RunManifest {
        schema: MANIFEST_SCHEMA,
        schema_version: MANIFEST_SCHEMA_VERSION,
        generated_at: current_timestamp(),
        tool_version: env!("CARGO_PKG_VERSION"),
        command: result.command,
        inputs,
        skipped_inputs: &result.skipped_files,
        config: &settings.config,
        stages: result.reports.as_ref(),
        curves: result.curves.as_ref(),
        artifacts: &result.artifacts,
        errors: &result.errors,
    };
    write_manifest(path, &manifest)
}

fn log_duplicates(report: &LinkageReport) {
    for id in &report.duplicate_ids {
        debug!(person_id = redact_value(id), "duplicated mortality identifier");
    }
}

fn push_cohort_summaries(
    stages: &mut Vec<StageSummary>,
    normalization: &NormalizationReport,
    derive: &DeriveReport,
    cohort: &FilterReport,
) {
    stages.push(StageSummary::new(
        "normalize",
        normalization.rows,
        normalization.rows,
        format!(
            "missing: {} diagnosis dates, {} birth dates, {} sites",
            normalization.missing_diagnosis_date,
            normalization.missing_birth_date,
            normalization.missing_site
        ),
    ));
    stages.push(StageSummary::new(
        "derive",
        derive.rows,
        derive.rows,
        format!(
            "{} without age, {} with negative survival",
            derive.missing_age, derive.negative_survival
        ),
    ));
    let mut input = cohort.input;
    for step in &cohort.steps {
        stages.push(StageSummary::new(
            format!("filter: {}", step.predicate),
            input,
            step.remaining,
            format!("{} removed", step.removed),
        ));
        input = step.remaining;
    }
}

fn push_report_summaries(stages: &mut Vec<StageSummary>, reports: &StageReports) {
    push_cohort_summaries(
        stages,
        &reports.normalization,
        &reports.derive,
        &reports.cohort,
    );
    stages.push(linkage_summary(&reports.linkage));
    stages.push(survival_summary(&reports.survival));
}

fn linkage_summary(report: &LinkageReport) -> StageSummary {
    StageSummary::new(
        "link",
        report.tumor_records,
        report.tumor_records,
        format!(
            "{} deaths ({} cancer, {} other), {} duplicate ids",
            report.matched,
            report.deaths_cancer,
            report.deaths_other,
            report.duplicate_ids.len()
        ),
    )
}

fn survival_summary(report: &SurvivalReport) -> StageSummary {
    StageSummary::new(
        "survival",
        report.records,
        report.observations,
        format!(
            "{} events, {} censored, {} negative durations dropped ({})",
            report.events, report.censored, report.negative_duration, report.unit
        ),
    )
}
