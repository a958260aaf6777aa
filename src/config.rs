use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::liveness::{DEFAULT_SMOOTHING_FACTOR, DEFAULT_STALE_THRESHOLD_MS};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of JPEG files played into the frame store
    #[serde(default = "default_frames_dir")]
    pub frames_dir: String,

    #[serde(default = "default_player_fps")]
    pub player_fps: f64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_stale_threshold_ms")]
    pub stale_threshold_ms: i64,

    #[serde(default = "default_smoothing_factor")]
    pub smoothing_factor: f64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Comma-separated `name=url` pairs monitored at startup
    #[serde(default)]
    pub monitor_targets: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_frames_dir() -> String {
    "frames".to_string()
}

fn default_player_fps() -> f64 {
    30.0
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_stale_threshold_ms() -> i64 {
    DEFAULT_STALE_THRESHOLD_MS
}

fn default_smoothing_factor() -> f64 {
    DEFAULT_SMOOTHING_FACTOR
}

fn default_request_timeout_ms() -> u64 {
    1500
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env(config::Environment::default())
    }

    /// Unset variables take their defaults; a variable that fails to parse is an error.
    fn from_env(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder().add_source(env).build()?;
        config
            .try_deserialize()
            .context("Invalid configuration in environment")
    }

    /// Parse `monitor_targets` into `(name, url)` pairs.
    pub fn targets(&self) -> Result<Vec<(String, String)>, ConfigError> {
        let Some(raw) = self.monitor_targets.as_deref() else {
            return Ok(Vec::new());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once('=') {
                Some((name, url)) if !name.trim().is_empty() && !url.trim().is_empty() => {
                    Ok((name.trim().to_string(), url.trim().to_string()))
                }
                _ => Err(ConfigError::MonitorTarget(entry.to_string())),
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            frames_dir: default_frames_dir(),
            player_fps: default_player_fps(),
            poll_interval_ms: default_poll_interval_ms(),
            stale_threshold_ms: default_stale_threshold_ms(),
            smoothing_factor: default_smoothing_factor(),
            request_timeout_ms: default_request_timeout_ms(),
            monitor_targets: None,
        }
    }
}
