//! Pricing command - inspect the cost table and pricing cache.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use roofscan_core::PricingTable;

use super::{cache_path, PricingChoice};
use crate::config::AppConfig;

/// Arguments for the pricing command
#[derive(Args)]
pub struct PricingArgs {
    #[command(subcommand)]
    pub command: PricingCommand,
}

/// Pricing subcommands
#[derive(Subcommand)]
pub enum PricingCommand {
    /// Print the cost table the next analysis would use
    Show {
        /// Pricing endpoint (overrides config)
        #[arg(long, value_name = "URL", conflicts_with_all = ["file", "builtin"])]
        url: Option<String>,
        /// Local pricing document (overrides config)
        #[arg(long, value_name = "FILE", conflicts_with = "builtin")]
        file: Option<PathBuf>,
        /// Derive the table from the built-in industry averages
        #[arg(long)]
        builtin: bool,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Delete the cached pricing document
    Clear,
    /// Print the pricing cache path
    Path,
}

/// Run the pricing command.
pub fn run(args: &PricingArgs, config: &AppConfig) -> Result<()> {
    match &args.command {
        PricingCommand::Show {
            url,
            file,
            builtin,
            pretty,
        } => {
            let mut choice = PricingChoice::from_config(config);
            if url.is_some() || file.is_some() || *builtin {
                choice.url.clone_from(url);
                choice.file.clone_from(file);
                choice.builtin = *builtin;
            }
            show(&choice, *pretty)
        }
        PricingCommand::Clear => clear(),
        PricingCommand::Path => {
            println!("{}", cache_path().display());
            Ok(())
        }
    }
}

fn show(choice: &PricingChoice, pretty: bool) -> Result<()> {
    let mut table = PricingTable::default_table();
    if let Some(source) = choice.source() {
        table
            .refresh(source.as_ref())
            .with_context(|| format!("Failed to load pricing from {}", source.describe()))?;
    }

    let json = if pretty {
        serde_json::to_string_pretty(&table)?
    } else {
        serde_json::to_string(&table)?
    };
    println!("{json}");
    Ok(())
}

fn clear() -> Result<()> {
    let path = cache_path();
    match std::fs::remove_file(&path) {
        Ok(()) => eprintln!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            eprintln!("No pricing cache at {}", path.display());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
    Ok(())
}
