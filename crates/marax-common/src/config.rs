//! ---
//! marax_section: "03-configuration-logging"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Exporter configuration model and loading."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_device() -> String {
    "/dev/serial0".to_owned()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_discard_initial_lines() -> usize {
    1
}

fn default_metrics_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_metrics_path() -> String {
    "/metrics".to_owned()
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for the exporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExporterConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// An [`ExporterConfig`] together with the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ExporterConfig,
    pub source: Option<PathBuf>,
}

impl ExporterConfig {
    pub const ENV_CONFIG_PATH: &'static str = "MARAX_CONFIG";

    /// Load configuration, respecting the `MARAX_CONFIG` override.
    ///
    /// Falls back to the first existing candidate and finally to defaults, so
    /// the exporter runs without any file at all.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(LoadedConfig {
                    config,
                    source: Some(path.to_path_buf()),
                });
            }
        }

        debug!("no configuration file found; using defaults");
        Ok(LoadedConfig {
            config: Self::default(),
            source: None,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.serial.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for ExporterConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: ExporterConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Where the machine is plugged in and how to talk to it.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialConfig {
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Deadline for one scrape's line read.
    #[serde(default = "default_read_timeout", rename = "read_timeout_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub read_timeout: Duration,
    /// Serial port read timeout; how often an abandoned read is noticed.
    #[serde(default = "default_poll_interval", rename = "poll_interval_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub poll_interval: Duration,
    /// Records thrown away right after the port is opened.
    #[serde(default = "default_discard_initial_lines")]
    pub discard_initial_lines: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            baud_rate: default_baud_rate(),
            read_timeout: default_read_timeout(),
            poll_interval: default_poll_interval(),
            discard_initial_lines: default_discard_initial_lines(),
        }
    }
}

impl SerialConfig {
    pub fn validate(&self) -> Result<()> {
        if self.device.trim().is_empty() {
            return Err(anyhow!("serial device path must not be empty"));
        }
        if self.baud_rate == 0 {
            return Err(anyhow!("serial baud_rate must be positive"));
        }
        if self.read_timeout.is_zero() {
            return Err(anyhow!("serial read_timeout_ms must be positive"));
        }
        if self.poll_interval.is_zero() || self.poll_interval >= self.read_timeout {
            return Err(anyhow!(
                "serial poll_interval_ms ({:?}) must be positive and shorter than read_timeout_ms ({:?})",
                self.poll_interval,
                self.read_timeout
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen: default_metrics_listen(),
            path: default_metrics_path(),
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.path.starts_with('/') {
            return Err(anyhow!(
                "metrics path '{}' must start with '/'",
                self.path
            ));
        }
        if self.path == "/" {
            return Err(anyhow!("metrics path must not be the index page '/'"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Directory for daily rolling log files. Stdout only when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            directory: None,
            file_prefix: None,
        }
    }
}
