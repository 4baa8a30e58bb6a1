//! Configuration file loading
//!
//! Bootstrap configuration lives in a single TOML file. The file is located
//! following this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`WFIMPORT_CONFIG`)
//! 3. Platform config directory (`<config_dir>/wfimport/config.toml`)
//! 4. None: compiled defaults are used

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "WFIMPORT_CONFIG";

/// Default Metadata Extraction Service base URL
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8188";

/// Default extraction endpoint path on the service
pub const DEFAULT_EXTRACT_PATH: &str = "/workflow-importer/extract";

/// Default multipart field carrying the image bytes
pub const DEFAULT_UPLOAD_FIELD: &str = "image";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Metadata Extraction Service base URL
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Path of the extraction endpoint, appended to `service_url`
    #[serde(default = "default_extract_path")]
    pub extract_path: String,

    /// Multipart field name for the uploaded image
    #[serde(default = "default_upload_field")]
    pub upload_field: String,

    /// Extraction request timeout in seconds (0 = transport default)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delay before a fully successful session closes itself
    #[serde(default = "default_auto_close_delay_ms")]
    pub auto_close_delay_ms: u64,

    /// HTTP port for `wfimport serve`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory that receives loaded workflow graphs (optional)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_extract_path() -> String {
    DEFAULT_EXTRACT_PATH.to_string()
}

fn default_upload_field() -> String {
    DEFAULT_UPLOAD_FIELD.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_auto_close_delay_ms() -> u64 {
    1500
}

fn default_port() -> u16 {
    5730
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            extract_path: default_extract_path(),
            upload_field: default_upload_field(),
            request_timeout_secs: default_request_timeout_secs(),
            auto_close_delay_ms: default_auto_close_delay_ms(),
            port: default_port(),
            output_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

/// Locate the config file to load, if any
///
/// An explicit CLI or environment path is returned even if it does not
/// exist, so that loading it reports the mistake instead of silently
/// falling back to defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
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

    // Priority 3: Platform config directory
    dirs::config_dir()
        .map(|d| d.join("wfimport").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the bootstrap config, falling back to compiled defaults
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => {
            let config = load_toml_config(&path)?;
            info!("Configuration loaded from {}", path.display());
            Ok(config)
        }
        None => {
            debug!("No config file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}
