//! Transmission recording inspector
//!
//! Usage:
//!   txinspect list recordings/transmissions-nightly.txrec
//!   txinspect replay recordings/transmissions-nightly.txrec --mode until-login --steps 3
//!   txinspect --config config/recording.toml replay session.txrec

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{load_config, RecordingConfig};
use recording::PlaybackMode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "txinspect")]
#[command(about = "Inspect and replay transmission recordings")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay (config/environments/<name>.toml)
    #[arg(short, long)]
    environment: Option<String>,

    /// Log level or filter directive; overrides the configured level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every entry with its sequence, time, type and description
    List {
        file: PathBuf,

        /// Stop after this many entries
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Play a recording through the transmission registry
    Replay {
        file: PathBuf,

        /// all, until-mutation, until-login or skip-login
        #[arg(short, long)]
        mode: Option<PlaybackMode>,

        /// Number of consecutive plays of the mode
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref(), args.environment.as_deref())
        .context("Failed to load recording configuration")?;
    init_logging(&args, &config)?;
    debug!(?config, "Configuration loaded");

    let result = match &args.command {
        Command::List { file, limit } => commands::list(file, *limit),
        Command::Replay { file, mode, steps } => commands::replay(file, *mode, *steps, &config),
    };
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

fn init_logging(args: &Args, config: &RecordingConfig) -> Result<()> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(config.logging.level.as_str());
    let filter = match &args.log_level {
        Some(_) => EnvFilter::try_new(level),
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level)),
    }
    .with_context(|| format!("Invalid log filter '{level}'"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if args.json_logs || config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
