//! CLI command implementations

use anyhow::{Context, Result};
use gen_preset::{build_preset, preset_file_name, FormMode, SeedSource};
use midi_analysis::{analyze as analyze_smf, summarize, AnalysisParams, MidiAnalysis};
use seedconf::{ConfigSources, SeedConfig};
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line choices that override the configured preset defaults.
pub struct PresetOptions {
    pub form: Option<FormMode>,
    pub seed: Option<SeedSource>,
    pub out_dir: Option<PathBuf>,
    pub stdout: bool,
}

fn load_analysis(file: &Path, max_bars: usize) -> Result<MidiAnalysis> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    analyze_smf(&bytes, &AnalysisParams::with_max_bars(max_bars))
        .with_context(|| format!("Failed to decode {}", file.display()))
}

/// Print the feature summary, or the whole analysis as JSON
pub fn analyze(config: &SeedConfig, file: &Path, max_bars: Option<usize>, json: bool) -> Result<()> {
    let max_bars = max_bars.unwrap_or(config.analysis.max_bars);
    anyhow::ensure!(max_bars >= 1, "--max-bars must be at least 1");

    let analysis = load_analysis(file, max_bars)?;

    if json {
        let output = serde_json::to_string_pretty(&analysis)?;
        println!("{}", output);
    } else {
        for line in summarize(&analysis) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Analyze a file and write (or print) its preset
pub fn preset(config: &SeedConfig, file: &Path, options: PresetOptions) -> Result<()> {
    let form = match options.form {
        Some(form) => form,
        None => config
            .preset
            .form_mode
            .parse()
            .context("Invalid preset.form_mode in configuration")?,
    };
    let seed = match options.seed {
        Some(seed) => seed,
        None => config
            .preset
            .seed
            .parse()
            .context("Invalid preset.seed in configuration")?,
    };

    let analysis = load_analysis(file, config.analysis.max_bars)?;
    let preset = build_preset(&analysis, form, seed);
    let json = preset.to_json_pretty()?;

    if options.stdout {
        println!("{}", json);
        return Ok(());
    }

    let out_dir = options.out_dir.unwrap_or_else(|| config.output.dir.clone());
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let path = out_dir.join(preset_file_name(file));
    std::fs::write(&path, json + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), seed = preset.seed, form = %form, "preset written");
    println!("{}", path.display());
    Ok(())
}

/// Print the effective configuration and where it came from
pub fn show_config(config: &SeedConfig, sources: &ConfigSources) {
    print!("{}", config.to_toml());

    println!();
    if sources.files.is_empty() {
        println!("# No config files loaded; using defaults");
    }
    for path in &sources.files {
        println!("# Loaded: {}", path.display());
    }
    for var in &sources.env_overrides {
        println!("# Env override: {}", var);
    }
}
