use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "clinic-followup";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the database location.
pub const ENV_DB_PATH: &str = "CLINIC_FOLLOWUP_DB";
/// Environment variable overriding the API listen address.
pub const ENV_LISTEN_ADDR: &str = "CLINIC_FOLLOWUP_ADDR";
/// Environment variable overriding the scheduled-date lookback.
pub const ENV_LOOKBACK_DAYS: &str = "CLINIC_FOLLOWUP_LOOKBACK_DAYS";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8710";

/// Upper bound on the scheduled-date lookback (100 years).
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot determine home directory")]
    NoHomeDirectory,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),
}

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "clinic_followup=info"
}

/// Get the application data directory
/// ~/ClinicFollowup/ on all platforms.
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home.join("ClinicFollowup"))
}

/// Default database file under the data directory.
pub fn default_db_path() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join("clinic.db"))
}

/// Day thresholds used to bucket a missed follow-up.
///
/// `diff_days` is `window_end - scheduled_date`:
/// - `diff <= 0` → protected
/// - `1..=lost_max_days` → lost to follow-up
/// - `abandoned_min_days..=abandoned_max_days` → abandoned
/// - anything else is left unclassified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub lost_max_days: i64,
    pub abandoned_min_days: i64,
    pub abandoned_max_days: i64,
    /// How far before the window start a scheduled date may fall and still
    /// bring the client into the report.
    pub lookback_days: i64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            lost_max_days: 30,
            abandoned_min_days: 60,
            abandoned_max_days: 90,
            lookback_days: 90,
        }
    }
}

impl ClassifierConfig {
    /// Build a config, rejecting overlapping or inverted buckets.
    pub fn new(
        lost_max_days: i64,
        abandoned_min_days: i64,
        abandoned_max_days: i64,
        lookback_days: i64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            lost_max_days,
            abandoned_min_days,
            abandoned_max_days,
            lookback_days,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lost_max_days < 1 {
            return Err(ConfigError::InvalidThresholds(
                "lost_max_days must be at least 1".into(),
            ));
        }
        if self.lost_max_days >= self.abandoned_min_days {
            return Err(ConfigError::InvalidThresholds(format!(
                "lost_max_days ({}) must be below abandoned_min_days ({})",
                self.lost_max_days, self.abandoned_min_days
            )));
        }
        if self.abandoned_min_days > self.abandoned_max_days {
            return Err(ConfigError::InvalidThresholds(format!(
                "abandoned_min_days ({}) exceeds abandoned_max_days ({})",
                self.abandoned_min_days, self.abandoned_max_days
            )));
        }
        if self.lookback_days < 0 {
            return Err(ConfigError::InvalidThresholds(
                "lookback_days must not be negative".into(),
            ));
        }
        if self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::InvalidThresholds(format!(
                "lookback_days ({}) exceeds {MAX_LOOKBACK_DAYS}",
                self.lookback_days
            )));
        }
        Ok(())
    }
}

/// Runtime settings for the report server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub listen_addr: SocketAddr,
    pub classifier: ClassifierConfig,
}

impl AppConfig {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary key lookup (testable without
    /// touching the process environment).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup(ENV_DB_PATH) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_db_path()?,
        };

        let addr_raw = lookup(ENV_LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = addr_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                key: ENV_LISTEN_ADDR.into(),
                value: addr_raw.clone(),
            })?;

        let mut classifier = ClassifierConfig::default();
        if let Some(raw) = lookup(ENV_LOOKBACK_DAYS) {
            classifier.lookback_days =
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_LOOKBACK_DAYS.into(),
                        value: raw.clone(),
                    })?;
        }
        classifier.validate()?;

        Ok(Self {
            db_path,
            listen_addr,
            classifier,
        })
    }
}
