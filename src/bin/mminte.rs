//! `mminte` command line: build pair community models and compute their
//! growth rates on a worker pool.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use mminte::analysis::{calculate_growth_rates_with_config, create_interaction_models_with_config};
use mminte::config::WorkerPoolConfig;
use mminte::core::AppResult;
use mminte::util::init_tracing;

/// Pairwise microbial community interaction analysis.
#[derive(Debug, Parser)]
#[command(name = "mminte", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Number of worker threads (default: MMINTE_WORKERS or min(cpus, 4)).
    #[arg(long, short = 'j', global = true)]
    workers: Option<usize>,

    /// Log at debug level instead of info.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a two-species community model for every pair of source models.
    PairModels {
        /// Source species model files (at least two).
        #[arg(required = true, num_args = 1..)]
        sources: Vec<PathBuf>,

        /// Folder the community models are written to.
        #[arg(long, short, default_value = "data")]
        output: PathBuf,
    },

    /// Compute growth rates of community models in a medium.
    GrowthRates {
        /// Community model files.
        #[arg(required = true, num_args = 1..)]
        models: Vec<PathBuf>,

        /// Medium file with the available flux per metabolite.
        #[arg(long, short)]
        medium: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(if cli.verbose { "mminte=debug" } else { "mminte=info" });

    let config = WorkerPoolConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("invalid worker pool configuration")?
        .with_optional_worker_count(cli.workers);
    config.validate().map_err(anyhow::Error::msg)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::PairModels { sources, output } => {
            let models = create_interaction_models_with_config(&sources, &output, &config)
                .context("creating pair community models")?;
            info!(count = models.len(), "Pair community models created");
            for model in models {
                writeln!(out, "{}", model.display())?;
            }
        }
        Command::GrowthRates {
            models,
            medium,
            format,
        } => {
            let table = calculate_growth_rates_with_config(&models, &medium, &config)
                .context("calculating growth rates")?;
            info!(rows = table.len(), "Growth rates calculated");
            match format {
                OutputFormat::Csv => table.write_csv(&mut out)?,
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(&mut out, &table)?;
                    writeln!(out)?;
                }
            }
        }
    }

    Ok(())
}
