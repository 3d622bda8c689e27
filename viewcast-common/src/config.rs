//! Configuration loading and resolution
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`VIEWCAST_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error; defaults apply. A config file that
//! exists but does not parse is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_MODEL_PATH: &str = "model.json";
pub const DEFAULT_DATASET_PATH: &str = "data/youtube_dataset.csv";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VIEWCAST_CONFIG";

const ENV_HOST: &str = "VIEWCAST_HOST";
const ENV_PORT: &str = "VIEWCAST_PORT";
const ENV_MODEL_PATH: &str = "VIEWCAST_MODEL_PATH";
const ENV_DATASET_PATH: &str = "VIEWCAST_DATASET_PATH";
const ENV_API_KEY: &str = "VIEWCAST_API_KEY";
const ENV_REQUEST_TIMEOUT: &str = "VIEWCAST_REQUEST_TIMEOUT_SECS";
const ENV_MAX_UPLOAD: &str = "VIEWCAST_MAX_UPLOAD_BYTES";
const ENV_LOG_LEVEL: &str = "VIEWCAST_LOG_LEVEL";

/// Contents of the TOML config file; every key optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub model_path: Option<PathBuf>,
    pub dataset_path: Option<PathBuf>,
    /// Video platform API key for live statistics
    pub api_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_upload_bytes: Option<usize>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error)
    pub level: Option<String>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub model_path: Option<PathBuf>,
    pub dataset_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub dataset_path: PathBuf,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl Settings {
    /// Resolve CLI → environment → TOML → defaults
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Result<Self> {
        let host = cli
            .host
            .or_else(|| env_string(ENV_HOST))
            .or(toml.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match cli.port {
            Some(port) => port,
            None => env_parsed(ENV_PORT)?.or(toml.port).unwrap_or(DEFAULT_PORT),
        };

        let model_path = cli
            .model_path
            .or_else(|| env_string(ENV_MODEL_PATH).map(PathBuf::from))
            .or(toml.model_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        let dataset_path = cli
            .dataset_path
            .or_else(|| env_string(ENV_DATASET_PATH).map(PathBuf::from))
            .or(toml.dataset_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH));

        let api_key = cli
            .api_key
            .or_else(|| env_string(ENV_API_KEY))
            .or(toml.api_key)
            .filter(|k| is_valid_key(k));

        let timeout_secs = match cli.request_timeout_secs {
            Some(secs) => secs,
            None => env_parsed(ENV_REQUEST_TIMEOUT)?
                .or(toml.request_timeout_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(Error::Config("request timeout must be at least 1 second".to_string()));
        }

        let max_upload_bytes = env_parsed(ENV_MAX_UPLOAD)?
            .or(toml.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let log_level = cli
            .log_level
            .or_else(|| env_string(ENV_LOG_LEVEL))
            .or(toml.logging.level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            host,
            port,
            model_path,
            dataset_path,
            api_key,
            request_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes,
            log_level,
        })
    }

    /// `host:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locate the config file: explicit path → `VIEWCAST_CONFIG` → user config dir.
///
/// Returns `None` when no file exists at any default location.
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_string(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|d| d.join("viewcast").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load the TOML config.
///
/// `None` or a missing file yields defaults with a warning; a file that
/// exists but fails to read or parse is an [`Error::Config`].
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config file {}", path.display());
    Ok(config)
}

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{}={:?} is not a valid value", name, raw))),
        None => Ok(None),
    }
}
