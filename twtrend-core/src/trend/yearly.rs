//! Year-to-date horizon.
//!
//! Raw daily feeds carry zero-volume ticks, unclosed sessions, single-security
//! ghost dates and small calendar mismatches between securities. The stages
//! below remove them in a fixed order:
//!
//! 1. drop zero-volume bars,
//! 2. drop today's bar while the session is still open,
//! 3. outer-join closes on date,
//! 4. forward-fill each security along the date axis,
//! 5. drop rows whose coverage is not above the minimum,
//! 6. keep the first and last row of each calendar month,
//! 7. rebase each security on its first kept close.
//!
//! Reordering stages changes which dates survive.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use tracing::{debug, warn};

use super::monthly::date_label;
use super::table::{pct_change, usable_baseline, AlignedRow, AlignedTable, Horizon, LabeledSeries};
use super::TrendAligner;
use crate::config::Exchange;
use crate::domain::{DailyBar, ValidTicker};
use crate::market::clock::year_start;
use crate::market::gate::{GateVerdict, SessionGate};

pub const DEFAULT_MIN_COVERAGE: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct YearlyAligner {
    gate: SessionGate,
    min_coverage: f64,
}

/// Close prices on a shared date axis; `cells[col][row]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseGrid {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<ValidTicker>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl CloseGrid {
    fn row_count(&self) -> usize {
        self.dates.len()
    }

    fn non_null(&self, row: usize) -> usize {
        self.cells.iter().filter(|c| c[row].is_some()).count()
    }

    fn retain_rows(&mut self, keep: &[bool]) {
        let mut i = 0;
        self.dates.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
        for col in &mut self.cells {
            let mut i = 0;
            col.retain(|_| {
                let k = keep[i];
                i += 1;
                k
            });
        }
    }
}

impl YearlyAligner {
    pub fn new(exchange: &Exchange, min_coverage: f64) -> Self {
        Self {
            gate: SessionGate::for_exchange(exchange),
            min_coverage,
        }
    }

    /// Stages 1 and 2 for one security.
    pub fn closed_bars(&self, bars: &[DailyBar], now: &DateTime<Tz>) -> Vec<DailyBar> {
        let mut kept: Vec<DailyBar> = bars
            .iter()
            .filter(|b| b.is_traded() && b.close.is_finite())
            .cloned()
            .collect();
        if let Some(last) = kept.last() {
            if self.gate.verdict(last.date, now) == GateVerdict::SessionNotClosed {
                debug!(date = %last.date, "dropping unclosed session bar");
                kept.pop();
            }
        }
        kept
    }

    /// Rows survive only with strictly more than `min_coverage` of `requested`
    /// securities populated, so a row at exactly the threshold is dropped.
    ///
    /// The threshold (`trend.yearly_min_coverage`, 0.30 by default) is a
    /// tunable noise heuristic, not a data invariant.
    pub fn coverage_filter(&self, grid: &mut CloseGrid, requested: usize) {
        if requested == 0 {
            grid.retain_rows(&vec![false; grid.row_count()]);
            return;
        }
        let keep: Vec<bool> = (0..grid.row_count())
            .map(|row| grid.non_null(row) as f64 / requested as f64 > self.min_coverage)
            .collect();
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            debug!(dropped, "rows below coverage removed");
        }
        grid.retain_rows(&keep);
    }
}

impl Default for YearlyAligner {
    fn default() -> Self {
        Self::new(&Exchange::default(), DEFAULT_MIN_COVERAGE)
    }
}

/// Stage 3: outer join of closes on date.
pub fn join_closes(series: &[(ValidTicker, Vec<DailyBar>)]) -> CloseGrid {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|(_, bars)| bars.iter().map(|b| b.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let cells = series
        .iter()
        .map(|(_, bars)| {
            let mut col = vec![None; dates.len()];
            for bar in bars {
                if let Ok(row) = dates.binary_search(&bar.date) {
                    col[row] = Some(bar.close);
                }
            }
            col
        })
        .collect();

    CloseGrid {
        dates,
        columns: series.iter().map(|(t, _)| t.clone()).collect(),
        cells,
    }
}

/// Stage 4: carry the last known close forward. Leading gaps stay empty.
pub fn forward_fill(grid: &mut CloseGrid) {
    for col in &mut grid.cells {
        let mut last = None;
        for cell in col.iter_mut() {
            match cell {
                Some(v) => last = Some(*v),
                None => *cell = last,
            }
        }
    }
}

/// Stage 6: first and last row of every calendar month.
pub fn month_endpoints(grid: &mut CloseGrid) {
    let n = grid.row_count();
    let month = |i: usize| (grid.dates[i].year(), grid.dates[i].month());
    let keep: Vec<bool> = (0..n)
        .map(|i| {
            let first = i == 0 || month(i - 1) != month(i);
            let last = i + 1 == n || month(i + 1) != month(i);
            first || last
        })
        .collect();
    grid.retain_rows(&keep);
}

/// Stage 7 and labels. Columns without a usable baseline are dropped.
fn rebase(grid: CloseGrid, close: NaiveTime) -> AlignedTable {
    let mut columns = Vec::new();
    let mut returns: Vec<Vec<Option<f64>>> = Vec::new();
    for (ticker, col) in grid.columns.into_iter().zip(grid.cells) {
        match col.iter().flatten().next().copied() {
            Some(baseline) if usable_baseline(baseline) => {
                returns.push(col.iter().map(|c| c.map(|p| pct_change(p, baseline))).collect());
                columns.push(ticker);
            }
            other => {
                warn!(code = %ticker.code, baseline = ?other, "yearly baseline unusable, omitted");
            }
        }
    }

    let rows = grid
        .dates
        .iter()
        .enumerate()
        .map(|(row, date)| {
            let at = date.and_time(close);
            AlignedRow {
                label: date_label(&at),
                at,
                values: returns.iter().map(|col| col[row]).collect(),
            }
        })
        .collect();

    AlignedTable {
        horizon: Horizon::Yearly,
        columns,
        rows,
    }
}

impl TrendAligner for YearlyAligner {
    fn horizon(&self) -> Horizon {
        Horizon::Yearly
    }

    fn window_start(&self, today: NaiveDate) -> NaiveDate {
        year_start(today)
    }

    fn align(&self, series: &[LabeledSeries], requested: usize, now: &DateTime<Tz>) -> AlignedTable {
        let cleaned: Vec<(ValidTicker, Vec<DailyBar>)> = series
            .iter()
            .filter_map(|s| {
                let bars = self.closed_bars(s.series.bars(), now);
                (!bars.is_empty()).then(|| (s.ticker.clone(), bars))
            })
            .collect();
        if cleaned.is_empty() {
            return AlignedTable::empty(Horizon::Yearly);
        }

        let mut grid = join_closes(&cleaned);
        forward_fill(&mut grid);
        self.coverage_filter(&mut grid, requested);
        month_endpoints(&mut grid);
        rebase(grid, self.gate.close_time())
    }
}
