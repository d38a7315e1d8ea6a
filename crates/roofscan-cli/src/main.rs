//! roofscan CLI - Damage analysis for roof inspection photos.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{analyze::AnalyzeArgs, Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load();

    let exit_code = match cli.command {
        Some(Commands::Analyze(args)) => analyze(args, &config),
        Some(Commands::Pricing(ref args)) => report(commands::pricing::run(args, &config)),
        Some(Commands::Models(ref args)) => report(commands::models::run(args, &config)),
        None => {
            // Default behavior: run analyze with flattened args
            if cli.analyze.paths.is_empty() {
                eprintln!("error: No paths specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            analyze(cli.analyze, &config)
        }
    };

    exit_code.into()
}

fn analyze(args: AnalyzeArgs, config: &AppConfig) -> ExitCode {
    let args = AnalyzeArgs::with_config(args, config);
    match commands::analyze::run(&args) {
        Ok(result) => {
            info!(
                "{} finding(s), estimated total ${}",
                result.analysis.findings.len(),
                result.analysis.total_estimate
            );
            result.exit_code
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}

fn report(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}
