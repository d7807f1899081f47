//! Weekly horizon: Monday to now, two points per trading day.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use tracing::warn;

use super::table::{merge_outer, pct_change, usable_baseline, AlignedTable, Horizon, LabeledSeries};
use super::TrendAligner;
use crate::config::Exchange;
use crate::market::clock::week_start;

#[derive(Debug, Clone)]
pub struct WeeklyAligner {
    open: NaiveTime,
    close: NaiveTime,
}

impl WeeklyAligner {
    pub fn new(exchange: &Exchange) -> Self {
        Self {
            open: exchange.open,
            close: exchange.close,
        }
    }

    /// Open price at session open, close price at session close.
    fn observations(&self, series: &LabeledSeries) -> Vec<(NaiveDateTime, f64)> {
        series
            .series
            .bars()
            .iter()
            .flat_map(|b| [(b.date.and_time(self.open), b.open), (b.date.and_time(self.close), b.close)])
            .collect()
    }
}

impl Default for WeeklyAligner {
    fn default() -> Self {
        Self::new(&Exchange::default())
    }
}

impl TrendAligner for WeeklyAligner {
    fn horizon(&self) -> Horizon {
        Horizon::Weekly
    }

    fn window_start(&self, today: NaiveDate) -> NaiveDate {
        week_start(today)
    }

    fn align(&self, series: &[LabeledSeries], _requested: usize, _now: &DateTime<Tz>) -> AlignedTable {
        let mut columns = Vec::with_capacity(series.len());
        for s in series {
            let points = self.observations(s);
            // Baseline is the first finite price; leading gaps are skipped.
            let Some(&(_, baseline)) = points.iter().find(|(_, price)| price.is_finite()) else {
                warn!(code = %s.ticker.code, "no finite weekly price, omitted");
                continue;
            };
            if !usable_baseline(baseline) {
                warn!(code = %s.ticker.code, baseline, "weekly baseline unusable, omitted");
                continue;
            }
            let returns = points
                .into_iter()
                .filter(|(_, price)| price.is_finite())
                .map(|(at, price)| (at, pct_change(price, baseline)))
                .collect();
            columns.push((s.ticker.clone(), returns));
        }
        merge_outer(Horizon::Weekly, columns, weekly_label)
    }
}

fn weekday_zh(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "週一",
        Weekday::Tue => "週二",
        Weekday::Wed => "週三",
        Weekday::Thu => "週四",
        Weekday::Fri => "週五",
        Weekday::Sat => "週六",
        Weekday::Sun => "週日",
    }
}

/// `12月8號 週一 09:00`
pub fn weekly_label(at: &NaiveDateTime) -> String {
    format!(
        "{}月{}號 {} {}",
        at.month(),
        at.day(),
        weekday_zh(at.weekday()),
        at.format("%H:%M")
    )
}
