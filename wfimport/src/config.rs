//! Configuration resolution for wfimport
//!
//! **Priority:** CLI → ENV → TOML → compiled defaults
//!
//! The TOML file supplies the base values (or compiled defaults when no file
//! exists); individual keys are then overridden by environment variables and
//! finally by command-line flags.

use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use wfimport_common::config::{LoggingConfig, TomlConfig};
use wfimport_common::{Error, Result};

/// Environment override for the extraction service URL
pub const ENV_SERVICE_URL: &str = "WFIMPORT_SERVICE_URL";
/// Environment override for the HTTP port
pub const ENV_PORT: &str = "WFIMPORT_PORT";
/// Environment override for the graph output directory
pub const ENV_OUTPUT_DIR: &str = "WFIMPORT_OUTPUT_DIR";

/// Values given on the command line (all optional)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub service_url: Option<String>,
    pub port: Option<u16>,
    pub output_dir: Option<PathBuf>,
    pub auto_close_delay_ms: Option<u64>,
}

/// Fully resolved importer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ImporterConfig {
    pub service_url: String,
    pub extract_path: String,
    pub upload_field: String,
    pub request_timeout_secs: u64,
    pub auto_close_delay_ms: u64,
    pub port: u16,
    pub output_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl From<TomlConfig> for ImporterConfig {
    fn from(toml: TomlConfig) -> Self {
        Self {
            service_url: toml.service_url,
            extract_path: toml.extract_path,
            upload_field: toml.upload_field,
            request_timeout_secs: toml.request_timeout_secs,
            auto_close_delay_ms: toml.auto_close_delay_ms,
            port: toml.port,
            output_dir: toml.output_dir,
            logging: toml.logging,
        }
    }
}

/// Read a non-blank environment variable
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ImporterConfig {
    /// Merge TOML values with environment and CLI overrides
    pub fn resolve(toml: TomlConfig, cli: &CliOverrides) -> Result<Self> {
        let mut config = Self::from(toml);

        // Tier 2: Environment variables
        if let Some(url) = env_value(ENV_SERVICE_URL) {
            info!("Extraction service URL loaded from environment variable");
            config.service_url = url;
        }
        if let Some(port) = env_value(ENV_PORT) {
            config.port = port
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("{}={} is not a valid port: {}", ENV_PORT, port, e)))?;
        }
        if let Some(dir) = env_value(ENV_OUTPUT_DIR) {
            config.output_dir = Some(PathBuf::from(dir));
        }

        // Tier 1: Command line
        if let Some(url) = &cli.service_url {
            config.service_url = url.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(dir) = &cli.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(delay) = cli.auto_close_delay_ms {
            config.auto_close_delay_ms = delay;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot work at runtime
    pub fn validate(&self) -> Result<()> {
        if !(self.service_url.starts_with("http://") || self.service_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "service_url must be an http(s) URL, got '{}'",
                self.service_url
            )));
        }
        if self.upload_field.trim().is_empty() {
            return Err(Error::Config("upload_field must not be empty".to_string()));
        }
        Ok(())
    }

    /// Request timeout, `None` meaning the transport default
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn auto_close_delay(&self) -> Duration {
        Duration::from_millis(self.auto_close_delay_ms)
    }
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self::from(TomlConfig::default())
    }
}
