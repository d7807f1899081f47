//! Serializable application configuration.
//!
//! Every field has a default, so an absent or partial TOML file is valid:
//!
//! ```toml
//! [exchange]
//! timezone = "Asia/Taipei"
//! close_time = "13:30"
//!
//! [trend]
//! yearly_min_coverage = 0.3
//!
//! [names]
//! secondary_table = "names.csv"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("invalid time '{value}' for {field} (expected HH:MM)")]
    InvalidTime { field: &'static str, value: String },

    #[error("yearly_min_coverage must be in [0, 1), got {0}")]
    InvalidCoverage(f64),

    #[error("quote_period_days must be at least 1")]
    InvalidQuotePeriod,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub provider: ProviderConfig,
    pub trend: TrendConfig,
    pub names: NamesConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.exchange.resolve()?;
        let c = self.trend.yearly_min_coverage;
        if !(0.0..1.0).contains(&c) {
            return Err(ConfigError::InvalidCoverage(c));
        }
        if self.trend.quote_period_days == 0 {
            return Err(ConfigError::InvalidQuotePeriod);
        }
        Ok(())
    }
}

/// The one exchange this tool follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub timezone: String,
    pub open_time: String,
    pub close_time: String,
    pub symbol_suffix: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Taipei".into(),
            open_time: "09:00".into(),
            close_time: "13:30".into(),
            symbol_suffix: ".TW".into(),
        }
    }
}

impl ExchangeConfig {
    /// Parse the textual fields into an [`Exchange`].
    pub fn resolve(&self) -> Result<Exchange, ConfigError> {
        let tz: Tz = self
            .timezone
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))?;
        Ok(Exchange {
            tz,
            open: parse_hhmm("open_time", &self.open_time)?,
            close: parse_hhmm("close_time", &self.close_time)?,
            symbol_suffix: self.symbol_suffix.clone(),
        })
    }
}

fn parse_hhmm(field: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| ConfigError::InvalidTime {
        field,
        value: value.to_string(),
    })
}

/// Parsed exchange parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub tz: Tz,
    /// Session open; tags the synthesized open observation.
    pub open: NaiveTime,
    /// Session close; closing prices are final from this time on.
    pub close: NaiveTime,
    pub symbol_suffix: String,
}

impl Default for Exchange {
    fn default() -> Self {
        Self {
            tz: chrono_tz::Asia::Taipei,
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(13, 30, 0).unwrap_or_default(),
            symbol_suffix: ".TW".into(),
        }
    }
}

/// HTTP provider behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub breaker_cooldown_secs: u64,
    /// Consecutive 429/5xx responses that open the breaker.
    pub breaker_failure_threshold: u32,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            breaker_cooldown_secs: 30 * 60,
            breaker_failure_threshold: 3,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }
}

/// Trend alignment knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Yearly rows need strictly more than this share of securities populated
    /// (after forward-fill) to survive. Empirically tuned.
    pub yearly_min_coverage: f64,
    /// Trading days fetched for the quote snapshot.
    pub quote_period_days: u32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            yearly_min_coverage: 0.3,
            quote_period_days: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamesConfig {
    /// Optional `code,name` CSV consulted after the built-in table.
    pub secondary_table: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_codes: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_codes: vec![
                "006208".into(),
                "2317".into(),
                "2353".into(),
                "00893".into(),
            ],
        }
    }
}
