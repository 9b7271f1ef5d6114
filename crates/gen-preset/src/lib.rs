//! Generative song-settings presets derived from MIDI analysis.
//!
//! A [`Preset`] pairs a seed with a [`GenInfo`] patch: only the settings the
//! analysis has an opinion on are present, everything else is left to the
//! generator's defaults.
//!
//! ```rust,no_run
//! use gen_preset::{build_preset, FormMode, SeedSource};
//! use midi_analysis::{analyze, AnalysisParams};
//!
//! let bytes = std::fs::read("song.mid").unwrap();
//! let analysis = analyze(&bytes, &AnalysisParams::default()).unwrap();
//! let preset = build_preset(&analysis, FormMode::Auto, SeedSource::Today);
//! println!("{}", preset.to_json_pretty().unwrap());
//! ```

pub mod form;
pub mod gen_info;
pub mod mapper;
pub mod seed;
pub mod tone;

pub use form::FormMode;
pub use gen_info::{GenInfo, SongPartType};
pub use mapper::map_analysis;
pub use seed::SeedSource;

use midi_analysis::MidiAnalysis;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Seed used when the caller supplies none.
pub const DEFAULT_SEED: u64 = 20_260_116;

const FALLBACK_BASE_NAME: &str = "midi";
const PRESET_SUFFIX: &str = "_preset.json";

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown form mode `{0}` (expected auto, loop, verseChorus or build)")]
    UnknownFormMode(String),

    #[error("invalid seed `{0}` (expected an integer, YYYY-MM-DD, `today` or `default`)")]
    InvalidSeed(String),

    #[error("failed to render preset: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The downloadable preset document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub seed: u64,
    #[serde(rename = "genInfo")]
    pub gen_info: GenInfo,
}

impl Preset {
    /// Render with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn build_preset(analysis: &MidiAnalysis, mode: FormMode, seed: SeedSource) -> Preset {
    let seed = seed.resolve();
    let gen_info = map_analysis(analysis, mode);
    debug!(seed, %mode, forced_parts = gen_info.forced_parts().is_some(), "built preset");
    Preset { seed, gen_info }
}

/// `<name without its last extension>_preset.json`.
pub fn preset_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let base = match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => stem,
        _ => name.as_str(),
    };
    let base = if base.is_empty() { FALLBACK_BASE_NAME } else { base };

    format!("{base}{PRESET_SUFFIX}")
}
