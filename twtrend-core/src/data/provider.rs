//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (Yahoo Finance, in-memory
//! CSV fixtures) so callers can swap implementations and mock for tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{RawSeries, SecurityCode};

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("bar file {path}: {reason}")]
    BarFile { path: String, reason: String },

    #[error("http client setup failed: {0}")]
    ClientSetup(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Lookback expressed the way upstream range queries are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    /// The most recent `n` trading days.
    TradingDays(u32),
}

impl Period {
    /// Upstream `range` parameter, e.g. `5d`.
    pub fn as_range(&self) -> String {
        match self {
            Period::TradingDays(n) => format!("{n}d"),
        }
    }
}

/// Trait for bar providers.
///
/// An empty series is a valid answer (holiday, not yet listed), never an error.
/// Errors are transport or upstream failures for that one security.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily bars with `start <= date < end`.
    fn fetch(
        &self,
        code: &SecurityCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, DataError>;

    /// Daily bars for a trailing period ending at the latest session.
    fn fetch_period(&self, code: &SecurityCode, period: Period) -> Result<RawSeries, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// Progress callback for multi-security operations.
pub trait FetchProgress {
    /// Called when starting to fetch a security.
    fn on_start(&self, code: &SecurityCode, index: usize, total: usize);

    /// Called when a security fetch completes; `Err` carries the warning text.
    fn on_complete(
        &self,
        code: &SecurityCode,
        index: usize,
        total: usize,
        result: &Result<(), String>,
    );

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that prints to stderr.
pub struct StderrProgress;

impl FetchProgress for StderrProgress {
    fn on_start(&self, code: &SecurityCode, index: usize, total: usize) {
        eprintln!("[{}/{}] 正在抓取: {code} ...", index + 1, total);
    }

    fn on_complete(
        &self,
        code: &SecurityCode,
        _index: usize,
        _total: usize,
        result: &Result<(), String>,
    ) {
        if let Err(e) = result {
            eprintln!("  FAIL: {code}: {e}");
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        eprintln!("抓取完成！ {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress reporter that discards everything.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_start(&self, _code: &SecurityCode, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _code: &SecurityCode,
        _index: usize,
        _total: usize,
        _result: &Result<(), String>,
    ) {
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_range_string() {
        assert_eq!(Period::TradingDays(5).as_range(), "5d");
    }

    #[test]
    fn errors_render_for_display() {
        let e = DataError::SymbolNotFound {
            symbol: "9999.TW".into(),
        };
        assert_eq!(e.to_string(), "symbol not found: 9999.TW");
    }
}
