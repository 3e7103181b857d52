//! CLI argument definitions for the registry pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "registry",
    version,
    about = "Cancer registry survival pipeline",
    long_about = "Prepare a tumor registry export for survival analysis.\n\n\
                  Normalizes and filters the tumor cohort, links it with the mortality\n\
                  registry and estimates Kaplan-Meier curves by tumor group, region and sex.\n\
                  Every stage table can be written, audited and fed to the next command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: $REGISTRY_CONFIG, then built-in defaults).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow person identifiers in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Combine the yearly mortality files of a directory into one table.
    Deaths(DeathsArgs),

    /// Normalize, derive and filter a tumor export into the adjusted cohort.
    Cohort(CohortArgs),

    /// Link an adjusted cohort with the mortality registry.
    Link(LinkArgs),

    /// Estimate and plot survival curves from a linked cohort.
    Curves(CurvesArgs),

    /// Count adult cases by region, sex and tumor group.
    Describe(DescribeArgs),

    /// Run every stage and write all tables, figures and a run manifest.
    Run(RunArgs),

    /// List the configured tumor groups.
    Groups,
}

#[derive(Parser)]
pub struct DeathsArgs {
    /// Directory holding the mortality files (.csv, .xlsx, .xls).
    #[arg(value_name = "DIR")]
    pub input: PathBuf,

    /// Combined mortality table to write.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct CohortArgs {
    /// Tumor registry export (.csv or spreadsheet).
    #[arg(value_name = "TUMOR_FILE")]
    pub input: PathBuf,

    /// Adjusted cohort table to write.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct LinkArgs {
    /// Adjusted cohort table.
    #[arg(value_name = "COHORT_FILE")]
    pub cohort: PathBuf,

    /// Combined mortality table, or a directory of mortality files.
    #[arg(value_name = "MORTALITY_PATH")]
    pub mortality: PathBuf,

    /// Linked cohort table to write.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct CurvesArgs {
    /// Linked cohort table.
    #[arg(value_name = "LINKED_FILE")]
    pub input: PathBuf,

    /// Directory for the SVG charts and curve tables.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,
}

#[derive(Parser)]
pub struct DescribeArgs {
    /// Adjusted cohort table.
    #[arg(value_name = "COHORT_FILE")]
    pub input: PathBuf,

    /// Case count table to write.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Tumor registry export (.csv or spreadsheet).
    #[arg(value_name = "TUMOR_FILE")]
    pub tumors: PathBuf,

    /// Mortality directory or combined mortality table.
    #[arg(value_name = "MORTALITY_PATH")]
    pub mortality: PathBuf,

    /// Output directory for stage tables, figures and the run manifest.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
