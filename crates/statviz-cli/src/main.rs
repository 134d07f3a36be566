//! StatViz CLI.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use statviz_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use statviz_cli::commands::{
    run_analyze, run_ask, run_blup, run_config, run_describe, run_explain, run_frbd, run_lmm,
    run_nonparametric, run_preview, run_probit, run_rbd, run_sheets, run_spatial, run_survival,
    run_transform,
};
use statviz_cli::logging::{LogConfig, LogFormat, init_logging};
use statviz_core::{ServiceConfig, ServiceRegistry};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok((output, code)) => {
            println!("{output}");
            code
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Output to print and the exit code to finish with.
fn run(cli: &Cli) -> Result<(String, i32)> {
    let config = || ServiceConfig::resolve(cli.config.as_deref(), &cli.overrides());
    let registry = || -> Result<&'static ServiceRegistry> { Ok(ServiceRegistry::init(config()?)?) };
    let output = match &cli.command {
        Command::Sheets { file } => run_sheets(file)?,
        Command::Preview(args) => run_preview(args, &config()?.upload_policy())?,
        Command::Describe(args) => run_describe(args, &config()?.upload_policy())?,
        Command::Config => run_config(&config()?)?,
        Command::Analyze(args) => {
            let output = run_analyze(registry()?, args)?;
            let code = i32::from(output.result.is_error());
            return Ok((output.rendered, code));
        }
        Command::Explain(args) => run_explain(registry()?, args)?,
        Command::Ask { question } => run_ask(registry()?, question)?,
        Command::Spatial(args) => run_spatial(registry()?, args)?,
        Command::Rbd(args) => run_rbd(registry()?, args)?,
        Command::Frbd(args) => run_frbd(registry()?, args)?,
        Command::Transform(args) => run_transform(registry()?, args)?,
        Command::Nonparametric(args) => run_nonparametric(registry()?, args)?,
        Command::Lmm(args) => run_lmm(registry()?, args)?,
        Command::Blup(args) => run_blup(registry()?, args)?,
        Command::Survival(args) => run_survival(registry()?, args)?,
        Command::Probit(args) => run_probit(registry()?, args)?,
    };
    Ok((output, 0))
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
