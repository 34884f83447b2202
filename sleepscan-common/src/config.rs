//! Configuration file discovery and TOML bootstrap loading
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `SLEEPSCAN_CONFIG` environment variable
//! 3. User config directory (`~/.config/sleepscan/<module>.toml` on Linux)
//! 4. System-wide `/etc/sleepscan/<module>.toml` (Linux only)
//!
//! A missing file is never fatal: the module logs a warning and starts with
//! compiled defaults. A file that exists but fails to parse is an error.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SLEEPSCAN_CONFIG";

/// Log levels accepted by `LoggingConfig::level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Logging configuration shared by all modules
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Reject levels `tracing` does not understand
    pub fn validate(&self) -> Result<()> {
        let level = self.level.to_ascii_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "Unknown log level '{}' (expected one of: {})",
                self.level,
                LOG_LEVELS.join(", ")
            )))
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolve which config file a module should read, if any
///
/// Returns the first candidate by priority. CLI and environment values are
/// returned even if the file does not exist, so the loader can warn about it;
/// platform locations are only returned when present on disk.
pub fn resolve_config_path(cli_arg: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3/4: Platform locations
    platform_config_candidates(module_name)
        .into_iter()
        .find(|path| path.exists())
}

/// Platform-specific config file locations, most specific first
fn platform_config_candidates(module_name: &str) -> Vec<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let mut candidates = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("sleepscan").join(&file_name));
    }

    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/sleepscan").join(&file_name));
    }

    candidates
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No config file was requested or discovered
    Defaults,
    /// A config file was requested but does not exist
    Missing(PathBuf),
    /// Values were read from this file
    File(PathBuf),
}

impl ConfigSource {
    /// Log the outcome once tracing is up
    ///
    /// Loading happens before the subscriber is installed (the log level
    /// itself comes from the file), so the loader records instead of logging.
    pub fn log(&self) {
        match self {
            ConfigSource::Defaults => info!("No config file found, using compiled defaults"),
            ConfigSource::Missing(path) => warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            ),
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
        }
    }
}

/// A parsed config together with its source
#[derive(Debug, Clone)]
pub struct LoadedConfig<T> {
    pub config: T,
    pub source: ConfigSource,
}

/// Load a TOML config file, falling back to defaults when it is absent
///
/// - `None` → compiled defaults
/// - path that does not exist → compiled defaults, `ConfigSource::Missing`
/// - path that exists but cannot be read or parsed → `Error::Config`
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<LoadedConfig<T>>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(LoadedConfig {
            config: T::default(),
            source: ConfigSource::Defaults,
        });
    };

    if !path.exists() {
        return Ok(LoadedConfig {
            config: T::default(),
            source: ConfigSource::Missing(path.to_path_buf()),
        });
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    Ok(LoadedConfig {
        config,
        source: ConfigSource::File(path.to_path_buf()),
    })
}
