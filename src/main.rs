//! Command-line maintenance entry point for the asset mirror.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use asset_mirror::MirrorConfig;

#[derive(Parser)]
#[command(
    name = "asset-mirror",
    version,
    about = "Maintenance tooling for internalized front-end assets"
)]
struct Cli {
    /// Path to the configuration file; discovered from the current
    /// directory when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Delete and recreate the internalized-asset tree and the cache map.
    Clear,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => MirrorConfig::from_path(path).unwrap_or_default(),
        None => MirrorConfig::discover(Path::new(".")),
    };

    let result = match cli.command {
        Command::Clear => asset_mirror::maintenance::clear(&config),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
