//! Configuration sections and their compiled defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Feature analysis limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Ceiling on the number of bars analyzed.
    /// Default: 512
    #[serde(default = "AnalysisConfig::default_max_bars")]
    pub max_bars: usize,
}

impl AnalysisConfig {
    fn default_max_bars() -> usize {
        512
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_bars: Self::default_max_bars(),
        }
    }
}

/// Preset generation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetConfig {
    /// Form selection: auto, loop, verseChorus or build.
    /// Default: auto
    #[serde(default = "PresetConfig::default_form_mode")]
    pub form_mode: String,

    /// Seed: an integer, a `YYYY-MM-DD` date, `today` or `default`.
    /// Default: 20260116
    #[serde(default = "PresetConfig::default_seed")]
    pub seed: String,
}

impl PresetConfig {
    fn default_form_mode() -> String {
        "auto".to_string()
    }

    fn default_seed() -> String {
        "20260116".to_string()
    }
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            form_mode: Self::default_form_mode(),
            seed: Self::default_seed(),
        }
    }
}

/// Where preset files are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default: current directory
    #[serde(default = "OutputConfig::default_dir")]
    pub dir: PathBuf,
}

impl OutputConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
