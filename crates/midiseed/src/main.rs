//! midiseed - derive generative song-settings presets from MIDI files
//!
//! Subcommands:
//! - `midiseed analyze <file>` - Print detected musical features
//! - `midiseed preset <file>` - Write `<name>_preset.json`
//! - `midiseed config` - Show the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gen_preset::{FormMode, SeedSource};
use seedconf::SeedConfig;
use std::path::PathBuf;

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "midiseed")]
#[command(about = "Derive generative song-settings presets from Standard MIDI Files")]
#[command(version)]
struct Cli {
    /// Config file used instead of ./midiseed.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a MIDI file and print what was detected
    Analyze {
        /// Standard MIDI File to read
        file: PathBuf,

        /// Maximum number of bars to analyze
        #[arg(long)]
        max_bars: Option<usize>,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a generator preset from a MIDI file
    Preset {
        /// Standard MIDI File to read
        file: PathBuf,

        /// Song form: auto, loop, verseChorus or build
        #[arg(short, long)]
        form: Option<FormMode>,

        /// Seed: integer, YYYY-MM-DD, today or default
        #[arg(short, long)]
        seed: Option<SeedSource>,

        /// Directory for the preset file
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Print the preset instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = SeedConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    telemetry::init(&config.telemetry.log_level);

    match cli.command {
        Commands::Analyze {
            file,
            max_bars,
            json,
        } => {
            commands::analyze(&config, &file, max_bars, json)?;
        }
        Commands::Preset {
            file,
            form,
            seed,
            out_dir,
            stdout,
        } => {
            let options = commands::PresetOptions {
                form,
                seed,
                out_dir,
                stdout,
            };
            commands::preset(&config, &file, options)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}
