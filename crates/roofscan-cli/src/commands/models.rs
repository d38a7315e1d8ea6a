//! Models command - manage detector weights.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use roofscan_adapters::{ModelSource, ModelStore, DETECTOR_FILENAME};

use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download detector weights
    Fetch {
        /// Download URL (overrides `[models] url`)
        #[arg(long, value_name = "URL")]
        url: Option<String>,
        /// Expected SHA-256 of the file (overrides `[models] sha256`)
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,
        /// File name inside the models directory
        #[arg(long, default_value = DETECTOR_FILENAME)]
        filename: String,
    },
    /// List installed models
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    let store = args
        .models_dir
        .clone()
        .or_else(|| config.models.dir.clone())
        .map_or_else(ModelStore::default, ModelStore::new);

    match &args.command {
        ModelsCommand::Fetch {
            url,
            sha256,
            filename,
        } => {
            let url = url
                .clone()
                .or_else(|| config.models.url.clone())
                .context("No download URL: pass --url or set [models] url in the config")?;
            let source = ModelSource {
                url,
                filename: filename.clone(),
                sha256: sha256.clone().or_else(|| config.models.sha256.clone()),
            };
            fetch_model(&store, &source)
        }
        ModelsCommand::List => list_models(&store),
        ModelsCommand::Path => {
            println!("{}", store.dir().display());
            Ok(())
        }
    }
}

fn fetch_model(store: &ModelStore, source: &ModelSource) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
            .progress_chars("#>-"),
    );
    pb.set_message(source.filename.clone());

    let mut on_progress = |downloaded: u64, total: Option<u64>| {
        if let Some(t) = total {
            pb.set_length(t);
        }
        pb.set_position(downloaded);
    };

    match store.fetch(source, &mut on_progress) {
        Ok(path) => {
            pb.finish_with_message(format!("Saved {}", path.display()));
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            Err(e)
        }
    }
}

fn list_models(store: &ModelStore) -> Result<()> {
    let models = store.list()?;

    println!("Models directory: {}", store.dir().display());
    println!();

    let detector_installed = models.iter().any(|m| m.filename == DETECTOR_FILENAME);
    let status = if detector_installed { "✓" } else { "✗" };
    println!("  {status} detector ({DETECTOR_FILENAME})");

    for model in models.iter().filter(|m| m.filename != DETECTOR_FILENAME) {
        println!("  · {} ({} bytes)", model.filename, model.size);
    }

    println!();
    println!("{} file(s) installed", models.len());
    Ok(())
}
