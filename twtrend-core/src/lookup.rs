//! Single-date historical lookup, gated on session close.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::{DataProvider, FetchProgress, NameDirectory};
use crate::domain::SecurityCode;
use crate::market::clock::end_after;
use crate::market::gate::{GateVerdict, SessionGate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub code: SecurityCode,
    pub name: String,
    /// `YYYY-MM-DD HH:MM`, stamped with the session close.
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryLookup {
    pub date: NaiveDate,
    pub verdict: GateVerdict,
    pub rows: Vec<HistoryRow>,
    /// Codes with no bar on `date`: holiday or not yet listed.
    pub missing: Vec<SecurityCode>,
    /// Fetch failures, one entry per code.
    pub warnings: Vec<String>,
}

impl HistoryLookup {
    fn gated(date: NaiveDate, verdict: GateVerdict) -> Self {
        Self {
            date,
            verdict,
            rows: Vec::new(),
            missing: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn timestamp_label(date: NaiveDate, close: NaiveTime) -> String {
    format!("{} {}", date.format("%Y-%m-%d"), close.format("%H:%M"))
}

/// Rows for `date`, or an empty result carrying the gate verdict when the
/// date is in the future or its session has not closed.
pub fn lookup<Z: TimeZone>(
    provider: &dyn DataProvider,
    names: &NameDirectory,
    gate: &SessionGate,
    codes: &[SecurityCode],
    date: NaiveDate,
    now: &DateTime<Z>,
    progress: &dyn FetchProgress,
) -> HistoryLookup {
    let verdict = gate.verdict(date, now);
    if !verdict.is_displayable() {
        info!(%date, ?verdict, "lookup gated");
        return HistoryLookup::gated(date, verdict);
    }

    let mut result = HistoryLookup::gated(date, verdict);
    let end = end_after(date);
    let total = codes.len();

    for (index, code) in codes.iter().enumerate() {
        progress.on_start(code, index, total);
        let status = match provider.fetch(code, date, end) {
            Ok(series) => {
                match series.bars().iter().find(|b| b.date == date) {
                    Some(bar) => {
                        result.rows.push(HistoryRow {
                            code: code.clone(),
                            name: names.resolve(code),
                            timestamp: timestamp_label(date, gate.close_time()),
                            open: bar.open,
                            high: bar.high,
                            low: bar.low,
                            close: bar.close,
                            volume: bar.volume,
                        });
                    }
                    None => {
                        debug!(%code, %date, "no bar on date");
                        result.missing.push(code.clone());
                    }
                }
                Ok(())
            }
            Err(e) => {
                let msg = format!("{code}: {e}");
                warn!(%code, %date, error = %e, "lookup fetch failed");
                result.warnings.push(msg.clone());
                Err(msg)
            }
        };
        progress.on_complete(code, index, total, &status);
    }

    progress.on_batch_complete(result.rows.len(), result.warnings.len(), total);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_uses_close_time() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 9).unwrap();
        let close = NaiveTime::from_hms_opt(13, 30, 0).unwrap();
        assert_eq!(timestamp_label(date, close), "2024-12-09 13:30");
    }
}
