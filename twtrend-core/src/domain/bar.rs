//! Daily bars and per-security series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ticker::SecurityCode;

/// One trading day of OHLCV for a single security.
///
/// Dates are exchange-local calendar dates. Prices are whatever the provider
/// reported; a missing field from the provider shows up as NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl DailyBar {
    /// Zero-volume bars are non-trading days or bad ticks.
    pub fn is_traded(&self) -> bool {
        self.volume > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarError {
    #[error("duplicate bar for {code} on {date}")]
    DuplicateDate { code: String, date: NaiveDate },
}

/// Ordered daily bars for one security.
///
/// Bars are ascending by date with no duplicate dates. Gaps are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub code: SecurityCode,
    bars: Vec<DailyBar>,
}

impl RawSeries {
    /// Build a series from bars in any order. Duplicate dates are rejected.
    pub fn new(code: SecurityCode, mut bars: Vec<DailyBar>) -> Result<Self, BarError> {
        bars.sort_by_key(|b| b.date);
        if let Some(w) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(BarError::DuplicateDate {
                code: code.to_string(),
                date: w[0].date,
            });
        }
        Ok(Self { code, bars })
    }

    /// Build a series keeping the last bar for any repeated date.
    ///
    /// Upstream feeds occasionally repeat the current session as a second row.
    pub fn dedup_last(code: SecurityCode, mut bars: Vec<DailyBar>) -> Self {
        // stable sort keeps arrival order within a date
        bars.sort_by_key(|b| b.date);
        let mut out: Vec<DailyBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match out.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => out.push(bar),
            }
        }
        Self { code, bars: out }
    }

    pub fn empty(code: SecurityCode) -> Self {
        Self {
            code,
            bars: Vec::new(),
        }
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Bars with `start <= date < end`.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            code: self.code.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start && b.date < end)
                .cloned()
                .collect(),
        }
    }

    /// The most recent `n` bars.
    pub fn tail(&self, n: usize) -> Self {
        let skip = self.bars.len().saturating_sub(n);
        Self {
            code: self.code.clone(),
            bars: self.bars[skip..].to_vec(),
        }
    }
}
