//! Monthly horizon: first of the month to now, one close per trading day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use tracing::warn;

use super::table::{merge_outer, pct_change, usable_baseline, AlignedTable, Horizon, LabeledSeries};
use super::TrendAligner;
use crate::config::Exchange;
use crate::market::clock::month_start;

#[derive(Debug, Clone)]
pub struct MonthlyAligner {
    close: NaiveTime,
}

impl MonthlyAligner {
    pub fn new(exchange: &Exchange) -> Self {
        Self {
            close: exchange.close,
        }
    }
}

impl Default for MonthlyAligner {
    fn default() -> Self {
        Self::new(&Exchange::default())
    }
}

impl TrendAligner for MonthlyAligner {
    fn horizon(&self) -> Horizon {
        Horizon::Monthly
    }

    fn window_start(&self, today: NaiveDate) -> NaiveDate {
        month_start(today)
    }

    fn align(&self, series: &[LabeledSeries], _requested: usize, _now: &DateTime<Tz>) -> AlignedTable {
        let mut columns = Vec::with_capacity(series.len());
        for s in series {
            let bars = s.series.bars();
            let Some(baseline) = bars.iter().map(|b| b.close).find(|c| c.is_finite()) else {
                warn!(code = %s.ticker.code, "no finite monthly close, omitted");
                continue;
            };
            if !usable_baseline(baseline) {
                warn!(code = %s.ticker.code, baseline, "monthly baseline unusable, omitted");
                continue;
            }
            let returns = bars
                .iter()
                .filter(|b| b.close.is_finite())
                .map(|b| (b.date.and_time(self.close), pct_change(b.close, baseline)))
                .collect();
            columns.push((s.ticker.clone(), returns));
        }
        merge_outer(Horizon::Monthly, columns, date_label)
    }
}

/// `MM/DD`
pub fn date_label(at: &NaiveDateTime) -> String {
    at.format("%m/%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DailyBar, RawSeries, ValidTicker};
    use chrono::TimeZone;

    fn bar(day: u32, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 12, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    fn labeled(code: &str, bars: Vec<DailyBar>) -> LabeledSeries {
        LabeledSeries::new(
            ValidTicker::new(code.into(), code),
            RawSeries::new(code.into(), bars).unwrap(),
        )
    }

    #[test]
    fn own_first_close_is_baseline() {
        let now = chrono_tz::Asia::Taipei.with_ymd_and_hms(2024, 12, 20, 15, 0, 0).unwrap();
        let table = MonthlyAligner::default().align(
            &[
                labeled("A", vec![bar(2, 50.0), bar(3, 55.0)]),
                labeled("B", vec![bar(3, 200.0), bar(4, 190.0)]),
            ],
            2,
            &now,
        );
        assert_eq!(table.labels(), vec!["12/02", "12/03", "12/04"]);
        assert_eq!(table.column(&"A".into()).unwrap()[0], Some(0.0));
        assert_eq!(table.column(&"B".into()).unwrap()[0], None);
        assert_eq!(table.value("12/03", &"B".into()), Some(0.0));
        assert!((table.value("12/04", &"B".into()).unwrap() + 5.0).abs() < 1e-9);
        assert_eq!(table.value("12/04", &"A".into()), None);
    }

    #[test]
    fn baseline_skips_missing_leading_close() {
        let now = chrono_tz::Asia::Taipei.with_ymd_and_hms(2024, 12, 13, 15, 0, 0).unwrap();
        let table = MonthlyAligner::default().align(
            &[labeled("2330", vec![bar(9, f64::NAN), bar(10, 110.0), bar(11, 121.0)])],
            1,
            &now,
        );
        assert_eq!(table.labels(), vec!["12/10", "12/11"]);
        let col = table.column(&"2330".into()).unwrap();
        assert_eq!(col[0], Some(0.0));
        assert!((col[1].unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn window_starts_on_the_first() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 20).unwrap();
        assert_eq!(
            MonthlyAligner::default().window_start(today),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
        );
    }
}
