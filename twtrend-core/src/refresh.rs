//! Session refresh: quotes first, then every requested horizon.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{AppConfig, ConfigError, Exchange, TrendConfig};
use crate::data::{DataProvider, FetchProgress, NameDirectory, Period};
use crate::domain::{SecurityCode, ValidTicker};
use crate::quote::{fetch_quotes, QuoteRow};
use crate::trend::{self, AlignedTable, Aligners, Horizon};

/// Everything one refresh produced. Owners replace the previous snapshot
/// with a new one; nothing is patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Exchange-local time the refresh started.
    pub updated_at: NaiveDateTime,
    pub quotes: Vec<QuoteRow>,
    pub tickers: Vec<ValidTicker>,
    pub warnings: Vec<String>,
    pub trends: BTreeMap<Horizon, AlignedTable>,
}

impl SessionSnapshot {
    pub fn trend(&self, horizon: Horizon) -> Option<&AlignedTable> {
        self.trends.get(&horizon)
    }

    pub fn updated_label(&self) -> String {
        self.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Refresher {
    aligners: Aligners,
    period: Period,
}

impl Refresher {
    pub fn new(exchange: &Exchange, trend: &TrendConfig) -> Self {
        Self {
            aligners: Aligners::new(exchange, trend),
            period: Period::TradingDays(trend.quote_period_days),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(&config.exchange.resolve()?, &config.trend))
    }

    pub fn aligners(&self) -> &Aligners {
        &self.aligners
    }

    /// Quote snapshot, then each horizon in `horizons` over the tickers that
    /// produced a quote. Horizons run independently of each other.
    pub fn refresh(
        &self,
        provider: &dyn DataProvider,
        names: &NameDirectory,
        codes: &[SecurityCode],
        now: &DateTime<Tz>,
        horizons: &[Horizon],
        progress: &dyn FetchProgress,
    ) -> SessionSnapshot {
        info!(codes = codes.len(), at = %now, "refresh started");
        let batch = fetch_quotes(provider, names, codes, self.period, progress);

        let trends = horizons
            .iter()
            .map(|&h| {
                let table = trend::build(self.aligners.get(h), provider, &batch.tickers, now);
                (h, table)
            })
            .collect();

        SessionSnapshot {
            updated_at: now.naive_local(),
            quotes: batch.rows,
            tickers: batch.tickers,
            warnings: batch.warnings,
            trends,
        }
    }
}

impl Default for Refresher {
    fn default() -> Self {
        Self::new(&Exchange::default(), &TrendConfig::default())
    }
}
