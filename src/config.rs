//! Client configuration loaded from environment variables.
//!
//! Tracker constants default to the platform's reference behavior: a 1 second
//! sampling period, progress writes every 5 watched seconds, and completion at
//! 90 percent.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::gate::UnlockPolicy;

/// Default API base URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Progress tracker tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Percent watched at which a video counts as completed
    pub completion_threshold: f64,
    /// Persist progress whenever the watched second is a multiple of this
    pub emit_interval_secs: u64,
    /// How often playback position is sampled
    pub sample_period: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            completion_threshold: 90.0,
            emit_interval_secs: 5,
            sample_period: Duration::from_secs(1),
        }
    }
}

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST API, including the `/api` prefix
    pub api_url: String,
    /// Where the bearer token is persisted between runs
    pub token_path: PathBuf,
    /// Transport-level request timeout
    pub http_timeout: Duration,
    pub tracker: TrackerConfig,
    pub unlock_policy: UnlockPolicy,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_path: PathBuf::from(".coursehub-token.json"),
            http_timeout: Duration::from_secs(30),
            tracker: TrackerConfig::default(),
            unlock_policy: UnlockPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every key is optional; unset keys fall back to the defaults above.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let tracker_defaults = TrackerConfig::default();

        let completion_threshold = parse_var(
            &lookup,
            "COURSEHUB_COMPLETION_THRESHOLD",
            tracker_defaults.completion_threshold,
        )?;
        if !(0.0..=100.0).contains(&completion_threshold) {
            return Err(ConfigError::Invalid {
                key: "COURSEHUB_COMPLETION_THRESHOLD",
                value: completion_threshold.to_string(),
            });
        }

        let emit_interval_secs = parse_var(
            &lookup,
            "COURSEHUB_EMIT_INTERVAL_SECS",
            tracker_defaults.emit_interval_secs,
        )?;
        if emit_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "COURSEHUB_EMIT_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let sample_period_ms: u64 = parse_var(&lookup, "COURSEHUB_SAMPLE_PERIOD_MS", 1000)?;
        if sample_period_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "COURSEHUB_SAMPLE_PERIOD_MS",
                value: "0".to_string(),
            });
        }

        let unlock_policy = match lookup("COURSEHUB_UNLOCK_POLICY") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "COURSEHUB_UNLOCK_POLICY",
                value: v,
            })?,
            None => defaults.unlock_policy,
        };

        Ok(Self {
            api_url: lookup("COURSEHUB_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            token_path: lookup("COURSEHUB_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.token_path),
            http_timeout: Duration::from_secs(parse_var(
                &lookup,
                "COURSEHUB_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
            tracker: TrackerConfig {
                completion_threshold,
                emit_interval_secs,
                sample_period: Duration::from_millis(sample_period_ms),
            },
            unlock_policy,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
