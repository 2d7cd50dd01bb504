mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use watchsync_core::config::Config;

#[derive(Parser)]
#[command(name = "watchsync")]
#[command(about = "Turn a viewing history export into calendar events, publishing only what is new")]
struct Cli {
    /// Config file (defaults to ~/.config/watchsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw export into the canonical dataset
    Ingest {
        /// Raw export to read (defaults to paths.raw_export)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Canonical dataset to write (defaults to paths.canonical_dataset)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Publish records newer than the watermark as calendar events
    Sync {
        /// Show the batch without requesting a token or publishing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the watermark and how many records are waiting
    Status,
    /// Inspect or rewind the watermark
    Watermark {
        #[command(subcommand)]
        action: WatermarkAction,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum WatermarkAction {
    Show,
    /// Store a new watermark date (YYYY-MM-DD)
    Set {
        date: String,

        #[arg(short, long, default_value = "")]
        title: String,
    },
    /// Remove the watermark so every record is published again
    Reset,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a starter config file
    Init,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if let Commands::Config { action } = &cli.command {
        let _guard = logging::init(cli.verbose, None)?;
        return match action {
            ConfigAction::Init => commands::config::init(&config_path),
            ConfigAction::Path => commands::config::path(&config_path),
        };
    }

    let config = Config::load(&config_path)
        .with_context(|| format!("Could not load config from {}", config_path.display()))?;
    let _guard = logging::init(cli.verbose, Some(&config.paths.log_file))?;

    match cli.command {
        Commands::Ingest { input, output } => {
            commands::ingest::run(&config, input.as_deref(), output.as_deref())
        }
        Commands::Sync { dry_run } => commands::sync::run(&config, dry_run).await,
        Commands::Status => commands::status::run(&config),
        Commands::Watermark { action } => match action {
            WatermarkAction::Show => commands::watermark::show(&config),
            WatermarkAction::Set { date, title } => commands::watermark::set(&config, &date, &title),
            WatermarkAction::Reset => commands::watermark::reset(&config),
        },
        Commands::Config { .. } => Ok(()),
    }
}
