//! gate - Checkpoint simulator
//! Interactive shell driving the checkpoint state machine and its cameras

mod shell;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use gate_camera::{SyntheticDriver, TraceDisplay};
use gate_orchestration::{Checkpoint, GateConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::shell::Shell;

#[derive(Parser)]
#[command(name = "gate")]
#[command(author = "Silvano Neto <dev@silvanoneto.com>")]
#[command(version = "2026.1.16")]
#[command(about = "Gate - access-control checkpoint simulator", long_about = None)]
struct Args {
    /// Camera feed: device index or URI (repeat for several cameras)
    #[arg(short, long = "camera", value_name = "FEED")]
    cameras: Vec<String>,

    /// Configuration file (gate.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root folder for event captures
    #[arg(long, value_name = "DIR")]
    capture_root: Option<PathBuf>,

    /// JSON file holding the event history
    #[arg(long, value_name = "FILE")]
    events_file: Option<PathBuf>,

    /// Accepted id (repeat to replace the configured allow list)
    #[arg(long = "allow", value_name = "ID")]
    allow: Vec<i64>,

    /// Also write logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn load_config(&self) -> Result<GateConfig> {
        let mut config = match &self.config {
            Some(path) => GateConfig::from_file(path)?,
            None => GateConfig::default(),
        };

        if !self.cameras.is_empty() {
            config.cameras.feeds = self.cameras.clone();
        }
        if let Some(root) = &self.capture_root {
            config.storage.capture_root = root.clone();
        }
        if let Some(file) = &self.events_file {
            config.storage.events_file = file.clone();
        }
        if !self.allow.is_empty() {
            config.machine.allow_list = self.allow.iter().copied().collect();
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn run(args: Args) -> Result<()> {
    init_tracing(args.log_file.as_ref())?;
    let config = args.load_config()?;

    let driver = Arc::new(SyntheticDriver::new(config.cameras.camera_config()));
    let checkpoint = Checkpoint::with_driver(config, driver, Arc::new(TraceDisplay))
        .context("failed to start checkpoint")?;

    let mut shell = Shell::new(checkpoint);
    shell.run()?;
    shell.into_checkpoint().shutdown()?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
