//! Trend alignment: per-horizon percentage-return tables.
//!
//! Every horizon follows the same two steps. [`fetch_window`] pulls each
//! ticker's bars for the horizon window one security at a time, logging and
//! skipping failures and empty results. A [`TrendAligner`] then turns the
//! surviving series into an [`AlignedTable`]. The second step is pure, so it is
//! what the tests exercise directly.

pub mod monthly;
pub mod table;
pub mod weekly;
pub mod yearly;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::config::{Exchange, TrendConfig};
use crate::data::DataProvider;
use crate::domain::ValidTicker;
use crate::market::clock::end_after;

pub use monthly::MonthlyAligner;
pub use table::{pct_change, usable_baseline, AlignedRow, AlignedTable, Horizon, LabeledSeries};
pub use weekly::WeeklyAligner;
pub use yearly::YearlyAligner;

/// One horizon's window and alignment policy.
pub trait TrendAligner: Send + Sync {
    fn horizon(&self) -> Horizon;

    /// First calendar date of the window containing `today`.
    fn window_start(&self, today: NaiveDate) -> NaiveDate;

    /// Build the table from fetched series.
    ///
    /// `requested` is the number of tickers handed to the horizon, including
    /// those that produced no series.
    fn align(&self, series: &[LabeledSeries], requested: usize, now: &DateTime<Tz>) -> AlignedTable;
}

/// Fetch `[start, end)` for each ticker in order. Failures and empty results
/// are logged and left out.
pub fn fetch_window(
    provider: &dyn DataProvider,
    tickers: &[ValidTicker],
    start: NaiveDate,
    end: NaiveDate,
    horizon: Horizon,
) -> Vec<LabeledSeries> {
    let mut out = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        match provider.fetch(&ticker.code, start, end) {
            Ok(series) if series.is_empty() => {
                warn!(%horizon, code = %ticker.code, %start, "no bars in window, omitted");
            }
            Ok(series) => {
                debug!(%horizon, code = %ticker.code, bars = series.len(), "fetched window");
                out.push(LabeledSeries::new(ticker.clone(), series));
            }
            Err(e) => {
                warn!(%horizon, code = %ticker.code, error = %e, "fetch failed, omitted");
            }
        }
    }
    out
}

/// Fetch and align one horizon as of `now`.
pub fn build(
    aligner: &dyn TrendAligner,
    provider: &dyn DataProvider,
    tickers: &[ValidTicker],
    now: &DateTime<Tz>,
) -> AlignedTable {
    let today = now.date_naive();
    let start = aligner.window_start(today);
    let series = fetch_window(provider, tickers, start, end_after(today), aligner.horizon());
    let table = aligner.align(&series, tickers.len(), now);
    info!(
        horizon = %aligner.horizon(),
        columns = table.columns.len(),
        rows = table.rows.len(),
        "aligned"
    );
    table
}

/// The three horizons configured for one exchange.
#[derive(Debug, Clone)]
pub struct Aligners {
    pub weekly: WeeklyAligner,
    pub monthly: MonthlyAligner,
    pub yearly: YearlyAligner,
}

impl Aligners {
    pub fn new(exchange: &Exchange, trend: &TrendConfig) -> Self {
        Self {
            weekly: WeeklyAligner::new(exchange),
            monthly: MonthlyAligner::new(exchange),
            yearly: YearlyAligner::new(exchange, trend.yearly_min_coverage),
        }
    }

    pub fn get(&self, horizon: Horizon) -> &dyn TrendAligner {
        match horizon {
            Horizon::Weekly => &self.weekly,
            Horizon::Monthly => &self.monthly,
            Horizon::Yearly => &self.yearly,
        }
    }
}

impl Default for Aligners {
    fn default() -> Self {
        Self::new(&Exchange::default(), &TrendConfig::default())
    }
}
