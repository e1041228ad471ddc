//! Client configuration.
//!
//! Configuration is sourced from the environment (with optional `.env`
//! support) so the UI shell can point at staging or production backends
//! without code changes. The periodic refresh cadence is deliberately a
//! configuration value rather than a constant.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

/// Application name used for data directory paths
const APP_NAME: &str = "fakturo";

/// Default backend origin.
const DEFAULT_API_BASE_URL: &str = "https://api.fakturo.app";

/// Default silent-refresh cadence in seconds.
/// Access tokens live about fifteen minutes; refreshing every five keeps a
/// wide margin without hammering the auth endpoint.
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Refresh cadences below this are flagged: they are far shorter than any
/// plausible token lifetime and usually a debugging leftover.
const SHORT_REFRESH_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend origin, without a trailing slash.
    pub api_base_url: String,
    /// Static key sent as `X-Api-Key` on every request.
    pub api_key: String,
    /// Cadence of the scheduled silent refresh while authenticated.
    pub refresh_interval: Duration,
    /// Override for the durable session store location.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn new(api_base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_key: api_key.into(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            data_dir: None,
        }
    }

    /// Override the silent-refresh cadence. Keep it well under the token
    /// lifetime the backend actually issues.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        if interval < Duration::from_secs(SHORT_REFRESH_INTERVAL_SECS) {
            warn!(?interval, "Refresh interval is far shorter than typical token lifetimes");
        }
        self.refresh_interval = interval;
        self
    }

    /// Override the durable session store location.
    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = Some(dir);
        self
    }

    /// Load configuration from the environment, reading `.env` first if one
    /// is present. `FAKTURO_API_KEY` is required; everything else falls back
    /// to defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let api_base_url =
            std::env::var("FAKTURO_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_key = std::env::var("FAKTURO_API_KEY").context("FAKTURO_API_KEY is not set")?;

        let mut config = Self::new(api_base_url, api_key);

        if let Ok(raw) = std::env::var("FAKTURO_REFRESH_INTERVAL_SECS") {
            let secs: u64 = raw
                .parse()
                .context("FAKTURO_REFRESH_INTERVAL_SECS must be a number of seconds")?;
            config = config.with_refresh_interval(Duration::from_secs(secs));
        }

        if let Ok(dir) = std::env::var("FAKTURO_DATA_DIR") {
            config = config.with_data_dir(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Directory backing the durable session store.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(base.join(APP_NAME))
    }
}
