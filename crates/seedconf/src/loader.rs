//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, SeedConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variables consulted, in the order they are applied.
pub const ENV_VARS: [&str; 5] = [
    "MIDISEED_MAX_BARS",
    "MIDISEED_FORM_MODE",
    "MIDISEED_SEED",
    "MIDISEED_OUTPUT_DIR",
    "MIDISEED_LOG_LEVEL",
];

/// Information about where config values came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// A CLI path replaces the local override and is returned even when it does
/// not exist, so that loading reports it.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/midiseed/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("midiseed/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("midiseed.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and lay its keys over `config`.
pub fn load_into(config: &mut SeedConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

/// Lay the keys present in a TOML document over `config`. Absent keys keep
/// their current value; unknown keys are ignored.
pub fn apply_toml(config: &mut SeedConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Some(analysis) = section(&table, "analysis") {
        if let Some(v) = analysis.get("max_bars") {
            let n = v.as_integer().ok_or_else(|| invalid("analysis.max_bars", "expected an integer"))?;
            config.analysis.max_bars = usize::try_from(n)
                .map_err(|_| invalid("analysis.max_bars", "must not be negative"))?;
        }
    }

    if let Some(preset) = section(&table, "preset") {
        if let Some(v) = preset.get("form_mode") {
            config.preset.form_mode = v
                .as_str()
                .ok_or_else(|| invalid("preset.form_mode", "expected a string"))?
                .to_string();
        }
        if let Some(v) = preset.get("seed") {
            config.preset.seed = match v {
                toml::Value::Integer(n) if *n >= 0 => n.to_string(),
                toml::Value::String(s) => s.clone(),
                _ => return Err(invalid("preset.seed", "expected a non-negative integer or a string")),
            };
        }
    }

    if let Some(output) = section(&table, "output") {
        if let Some(v) = output.get("dir") {
            let dir = v.as_str().ok_or_else(|| invalid("output.dir", "expected a string"))?;
            config.output.dir = expand_path(dir);
        }
    }

    if let Some(telemetry) = section(&table, "telemetry") {
        if let Some(v) = telemetry.get("log_level") {
            config.telemetry.log_level = v
                .as_str()
                .ok_or_else(|| invalid("telemetry.log_level", "expected a string"))?
                .to_string();
        }
    }

    Ok(())
}

fn section<'a>(table: &'a toml::Table, name: &str) -> Option<&'a toml::Table> {
    table.get(name).and_then(|v| v.as_table())
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Apply `MIDISEED_*` overrides using `lookup` to read each variable.
pub fn apply_env_overrides_with<F>(
    config: &mut SeedConfig,
    sources: &mut ConfigSources,
    lookup: F,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for name in ENV_VARS {
        let Some(value) = lookup(name) else {
            continue;
        };
        match name {
            "MIDISEED_MAX_BARS" => {
                config.analysis.max_bars = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid(name, &format!("`{value}` is not a bar count")))?;
            }
            "MIDISEED_FORM_MODE" => config.preset.form_mode = value,
            "MIDISEED_SEED" => config.preset.seed = value,
            "MIDISEED_OUTPUT_DIR" => config.output.dir = expand_path(&value),
            "MIDISEED_LOG_LEVEL" => config.telemetry.log_level = value,
            _ => continue,
        }
        sources.env_overrides.push(name.to_string());
    }
    Ok(())
}

/// Expand `~/` and `$VAR` prefixes.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        let (var_name, rest) = match stripped.split_once('/') {
            Some((name, rest)) => (name, Some(rest)),
            None => (stripped, None),
        };
        if let Ok(var_value) = env::var(var_name) {
            let base = PathBuf::from(var_value);
            return match rest {
                Some(rest) => base.join(rest),
                None => base,
            };
        }
    }
    PathBuf::from(path)
}
