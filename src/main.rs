//! # GPFS Tune CLI (`gpfs-tune`)
//!
//! Runs the dataset pipeline one stage at a time.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gpfs-tune collect` | Clone the configured repositories and harvest text chunks |
//! | `gpfs-tune generate` | Turn chunks plus curated pairs into a deduplicated JSONL dataset |
//! | `gpfs-tune prepare` | Split the dataset and write the training plan |
//! | `gpfs-tune finetune` | Prepare, then launch the configured trainer |
//! | `gpfs-tune stats` | Summarize the chunk file and dataset |
//! | `gpfs-tune completions <shell>` | Print a shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! gpfs-tune collect --config ./config/gpfs-tune.toml
//! gpfs-tune collect --skip-clone --progress json
//! gpfs-tune generate
//! gpfs-tune finetune --dry-run
//! RUST_LOG=gpfs_tune=debug gpfs-tune stats
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use gpfs_tune::progress::ProgressMode;
use gpfs_tune::{collect, config, finetune, generate, stats};

const DEFAULT_CONFIG: &str = "./config/gpfs-tune.toml";

/// GPFS Tune — harvest IBM Storage Scale documentation into a Q&A dataset
/// and prepare LoRA fine-tuning runs.
#[derive(Parser)]
#[command(
    name = "gpfs-tune",
    about = "GPFS Tune — build a Q&A fine-tuning dataset about IBM Storage Scale",
    version,
    long_about = "GPFS Tune clones IBM Storage Scale repositories, harvests markdown, YAML and \
    docstring text, templates it into question/answer pairs alongside a curated list, and \
    prepares 4-bit LoRA fine-tuning runs for an external trainer."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/gpfs-tune.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone repositories and harvest text chunks.
    ///
    /// Shallow-clones each configured repository (skipping existing
    /// checkouts), extracts markdown, YAML and Python module docstrings,
    /// appends the built-in diagnostics knowledge, and writes the chunk file.
    Collect {
        /// Harvest existing checkouts without cloning.
        #[arg(long)]
        skip_clone: bool,

        /// Progress output on stderr. Defaults to `human` on a TTY, `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Generate the Q&A dataset from harvested chunks.
    Generate,

    /// Split the dataset and write train/test files plus the training plan.
    Prepare,

    /// Prepare, then launch the configured trainer on the plan.
    Finetune {
        /// Write the plan without launching the trainer.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show chunk and dataset statistics.
    Stats,

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gpfs_tune=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "gpfs-tune", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = match &cli.config {
        Some(path) => config::load_or_default(path, true)?,
        None => config::load_or_default(&PathBuf::from(DEFAULT_CONFIG), false)?,
    };

    match cli.command {
        Commands::Collect {
            skip_clone,
            progress,
        } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            collect::run_collect(&cfg, skip_clone, mode.reporter().as_ref())?;
        }
        Commands::Generate => {
            generate::run_generate(&cfg)?;
        }
        Commands::Prepare => {
            finetune::prepare(&cfg)?;
        }
        Commands::Finetune { dry_run } => {
            finetune::run_finetune(&cfg, dry_run).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
