//! Configuration loading and logging bootstrap
//!
//! Configuration is resolved in priority order:
//! 1. Explicit path handed to the resolver (highest priority)
//! 2. `MLF_CONFIG` environment variable
//! 3. User config file (`<config dir>/mlf/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing configuration file never aborts: a warning is logged and the
//! compiled defaults are used. A file that exists but fails to parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable naming a configuration file
pub const CONFIG_ENV_VAR: &str = "MLF_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Default prediction options (optional)
    #[serde(default)]
    pub prediction: PredictionOptions,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Options applied to a prediction call
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct PredictionOptions {
    /// Input keys are field names (true) or field ids (false)
    #[serde(default = "default_by_name")]
    pub by_name: bool,

    /// Probability output as a bare list ordered by class name
    #[serde(default)]
    pub compact: bool,
}

impl Default for PredictionOptions {
    fn default() -> Self {
        Self {
            by_name: default_by_name(),
            compact: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_by_name() -> bool {
    true
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Resolves which configuration file to use and loads it
pub struct ConfigResolver {
    explicit_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Resolver without an explicit path
    pub fn new() -> Self {
        Self { explicit_path: None }
    }

    /// Resolver that prefers the given path over every other source
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit_path: Some(path.into()),
        }
    }

    /// Locate the configuration file, if any source names one that exists
    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!("Config file {} not found, trying other sources", path.display());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            warn!(
                "{} points to missing file {}, trying other sources",
                CONFIG_ENV_VAR,
                path.display()
            );
        }

        default_config_path().filter(|path| path.exists())
    }

    /// Load the resolved configuration, falling back to compiled defaults
    pub fn resolve(&self) -> Result<TomlConfig> {
        match self.locate() {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                TomlConfig::load(&path)
            }
            None => {
                warn!("No configuration file found, using compiled defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform config file location (`~/.config/mlf/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mlf").join("config.toml"))
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the configured level when set. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", config.level, e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| Error::Config(format!("Logging already initialized: {}", e)))
}
