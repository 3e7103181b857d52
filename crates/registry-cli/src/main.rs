//! Registry survival pipeline CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use registry_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use registry_cli::commands::{
    Settings, run_all, run_cohort, run_curves, run_deaths, run_describe, run_groups, run_link,
};
use registry_cli::logging::{LogConfig, LogFormat, init_logging};
use registry_cli::summary::print_summary;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("error: {error:#}");
            std::process::exit(1);
        }
    };
    let outcome = match &cli.command {
        Command::Deaths(args) => run_deaths(&settings, args),
        Command::Cohort(args) => run_cohort(&settings, args),
        Command::Link(args) => run_link(&settings, args),
        Command::Curves(args) => run_curves(&settings, args),
        Command::Describe(args) => run_describe(&settings, args),
        Command::Run(args) => run_all(&settings, args),
        Command::Groups => {
            run_groups(&settings);
            std::process::exit(0);
        }
    };
    let exit_code = match outcome {
        Ok(result) => {
            print_summary(&result);
            i32::from(result.has_errors())
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
