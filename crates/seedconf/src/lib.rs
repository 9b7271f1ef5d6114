//! Layered configuration for midiseed.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/midiseed/config.toml` (system)
//! 2. `~/.config/midiseed/config.toml` (user)
//! 3. `./midiseed.toml` (local override, replaced by `--config`)
//! 4. Environment variables (`MIDISEED_*`)
//!
//! # Example Config
//!
//! ```toml
//! [analysis]
//! max_bars = 512
//!
//! [preset]
//! form_mode = "auto"
//! seed = 20260116
//!
//! [output]
//! dir = "~/presets"
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod loader;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use settings::{AnalysisConfig, OutputConfig, PresetConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Complete midiseed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub preset: PresetConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl SeedConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load with an explicit config file in place of `./midiseed.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        let mut sources = ConfigSources::default();
        let config = Self::layered(&files, &mut sources, |name| std::env::var(name).ok())?;
        Ok((config, sources))
    }

    /// Defaults, then each file in order, then environment overrides.
    pub fn layered<F>(
        files: &[PathBuf],
        sources: &mut ConfigSources,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SeedConfig::default();

        for path in files {
            loader::load_into(&mut config, path)?;
            sources.files.push(path.clone());
        }

        loader::apply_env_overrides_with(&mut config, sources, env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.max_bars == 0 {
            return Err(ConfigError::InvalidValue {
                key: "analysis.max_bars".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# midiseed configuration\n\n");

        output.push_str("[analysis]\n");
        output.push_str(&format!("max_bars = {}\n", self.analysis.max_bars));

        output.push_str("\n[preset]\n");
        output.push_str(&format!("form_mode = {}\n", quoted(&self.preset.form_mode)));
        match self.preset.seed.parse::<u64>() {
            Ok(seed) => output.push_str(&format!("seed = {seed}\n")),
            Err(_) => output.push_str(&format!("seed = {}\n", quoted(&self.preset.seed))),
        }

        output.push_str("\n[output]\n");
        output.push_str(&format!(
            "dir = {}\n",
            quoted(&self.output.dir.display().to_string())
        ));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = {}\n", quoted(&self.telemetry.log_level)));

        output
    }
}

/// A TOML basic string.
fn quoted(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SeedConfig::default();
        assert_eq!(config.analysis.max_bars, 512);
        assert_eq!(config.preset.form_mode, "auto");
        assert_eq!(config.preset.seed, "20260116");
        assert_eq!(config.output.dir, PathBuf::from("."));
    }

    #[test]
    fn test_to_toml() {
        let toml = SeedConfig::default().to_toml();
        assert!(toml.contains("[analysis]\nmax_bars = 512\n"));
        assert!(toml.contains("form_mode = \"auto\"\n"));
        assert!(toml.contains("seed = 20260116\n"));
        assert!(toml.contains("[telemetry]"));
    }

    #[test]
    fn test_to_toml_reparses() {
        let mut config = SeedConfig::default();
        config.preset.seed = "today".to_string();
        config.output.dir = PathBuf::from("/srv/\"quoted\" dir");

        let mut back = SeedConfig::default();
        loader::apply_toml(&mut back, &config.to_toml(), Path::new("roundtrip.toml")).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_zero_bars_rejected() {
        let mut sources = ConfigSources::default();
        let err = SeedConfig::layered(&[], &mut sources, |name| {
            (name == "MIDISEED_MAX_BARS").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
