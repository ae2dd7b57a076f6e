mod app;
mod input;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
};
use termipet::config::{clamp_speed, project_paths};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "termipet")]
#[command(about = "A virtual pet that keeps living while the terminal is closed")]
pub(crate) struct Cli {
    /// Name for a new pet (asked interactively otherwise)
    #[arg(long)]
    name: Option<String>,

    /// Owner recorded on a new pet
    #[arg(long)]
    owner: Option<String>,

    /// Save file name inside the pets directory. Example: rex.json
    #[arg(long)]
    pet: Option<String>,

    /// Use this directory instead of the platform data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Run the pet's clock this many times faster than real time (at most 3600)
    #[arg(long)]
    speed: Option<f64>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // the terminal is in raw mode, so logs go to a file
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();
    let paths = project_paths(cli.data_dir.clone())?;
    init_logging(&paths.log_path)?;

    if let Some(asked) = cli.speed {
        let speed = clamp_speed(asked);
        if speed != asked {
            tracing::warn!(asked, speed, "--speed out of range, clamped");
        }
        cli.speed = Some(speed);
    }
    app::run(cli, paths)
}
