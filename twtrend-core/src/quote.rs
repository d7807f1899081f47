//! Latest-day quote snapshot; the source of the session's ticker list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::{DataProvider, FetchProgress, NameDirectory, Period};
use crate::domain::{SecurityCode, ValidTicker};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub code: SecurityCode,
    pub name: String,
    pub date: NaiveDate,
    pub close: f64,
    pub change: f64,
    pub change_pct: f64,
    pub volume: u64,
}

impl QuoteRow {
    pub fn is_up(&self) -> bool {
        self.change > 0.0
    }

    pub fn is_down(&self) -> bool {
        self.change < 0.0
    }
}

/// Result of one snapshot pass. Always complete; per-code problems land in
/// `warnings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteBatch {
    pub rows: Vec<QuoteRow>,
    pub tickers: Vec<ValidTicker>,
    pub warnings: Vec<String>,
}

/// Change against the previous close; zero when the previous close is unusable.
pub fn change_from(prev_close: f64, close: f64) -> (f64, f64) {
    let change = close - prev_close;
    let pct = if prev_close > 0.0 {
        change / prev_close * 100.0
    } else {
        0.0
    };
    (change, pct)
}

/// Fetch the trailing period for each code in order and summarize the last bar.
pub fn fetch_quotes(
    provider: &dyn DataProvider,
    names: &NameDirectory,
    codes: &[SecurityCode],
    period: Period,
    progress: &dyn FetchProgress,
) -> QuoteBatch {
    let total = codes.len();
    let mut batch = QuoteBatch::default();
    info!(total, provider = provider.name(), "fetching quotes");

    for (index, code) in codes.iter().enumerate() {
        progress.on_start(code, index, total);
        let outcome = match provider.fetch_period(code, period) {
            Ok(series) => match series.bars() {
                [] => Err(format!("no data for {code}")),
                [.., prev, latest] => Ok((prev.close, latest.clone())),
                [latest] => Ok((latest.close, latest.clone())),
            },
            Err(e) => Err(format!("{code}: {e}")),
        };

        let status = match outcome {
            Ok((prev_close, latest)) => {
                let name = names.resolve(code);
                let (change, change_pct) = change_from(prev_close, latest.close);
                debug!(%code, %name, close = latest.close, change_pct, "quote");
                batch.rows.push(QuoteRow {
                    code: code.clone(),
                    name: name.clone(),
                    date: latest.date,
                    close: latest.close,
                    change,
                    change_pct,
                    volume: latest.volume,
                });
                batch.tickers.push(ValidTicker::new(code.clone(), name));
                Ok(())
            }
            Err(msg) => {
                warn!(%code, reason = %msg, "quote skipped");
                batch.warnings.push(msg.clone());
                Err(msg)
            }
        };
        progress.on_complete(code, index, total, &status);
    }

    progress.on_batch_complete(batch.rows.len(), batch.warnings.len(), total);
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_uses_previous_close() {
        let (change, pct) = change_from(100.0, 105.0);
        assert!((change - 5.0).abs() < 1e-9);
        assert!((pct - 5.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_previous_close_gives_zero_pct() {
        let (change, pct) = change_from(0.0, 5.0);
        assert_eq!(change, 5.0);
        assert_eq!(pct, 0.0);
    }
}
