//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::modes::NamingMode;
use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub progress: ProgressConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Download engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory receiving assembled files.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Segment fetches in flight per job.
    #[serde(default = "default_max_concurrent_segments")]
    pub max_concurrent_segments: usize,

    /// Jobs dispatched at the same time.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Timeout for playlist requests, in seconds.
    #[serde(default = "default_playlist_timeout")]
    pub playlist_timeout_secs: u64,

    /// Timeout for each segment request, in seconds.
    #[serde(default = "default_segment_timeout")]
    pub segment_timeout_secs: u64,

    /// User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// How output files are named when the request does not say.
    #[serde(default)]
    pub naming: NamingMode,
}

/// Progress stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Milliseconds between snapshots.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Frames buffered per observer before the oldest are dropped.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            max_concurrent_segments: default_max_concurrent_segments(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            playlist_timeout_secs: default_playlist_timeout(),
            segment_timeout_secs: default_segment_timeout(),
            user_agent: default_user_agent(),
            naming: NamingMode::default(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

impl DownloadConfig {
    pub fn playlist_timeout(&self) -> Duration {
        Duration::from_secs(self.playlist_timeout_secs)
    }

    pub fn segment_timeout(&self) -> Duration {
        Duration::from_secs(self.segment_timeout_secs)
    }
}

impl ProgressConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_directory() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_max_concurrent_segments() -> usize {
    10
}

fn default_max_concurrent_jobs() -> usize {
    1
}

fn default_playlist_timeout() -> u64 {
    15
}

fn default_segment_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_subscriber_buffer() -> usize {
    16
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Address string the HTTP server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
