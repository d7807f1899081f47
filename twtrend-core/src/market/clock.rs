//! Exchange-local clock and horizon window starts.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::Exchange;

/// Supplies "now" in the exchange timezone.
///
/// A fixed instant can be pinned for reproducible runs.
#[derive(Debug, Clone)]
pub struct MarketClock {
    exchange: Exchange,
    fixed: Option<DateTime<Tz>>,
}

impl MarketClock {
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange,
            fixed: None,
        }
    }

    /// Clock frozen at an exchange-local wall time. `None` if the wall time
    /// does not exist in the exchange timezone.
    pub fn fixed_local(exchange: Exchange, local: NaiveDateTime) -> Option<Self> {
        let at = exchange.tz.from_local_datetime(&local).earliest()?;
        Some(Self {
            exchange,
            fixed: Some(at),
        })
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    pub fn now(&self) -> DateTime<Tz> {
        match self.fixed {
            Some(at) => at,
            None => Utc::now().with_timezone(&self.exchange.tz),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Most recent Monday on or before `today`.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    let back = u64::from(today.weekday().num_days_from_monday());
    today - Days::new(back)
}

/// First calendar day of `today`'s month.
pub fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

/// January 1 of `today`'s year.
pub fn year_start(today: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today)
}

/// Exclusive end bound that still covers `today`.
pub fn end_after(today: NaiveDate) -> NaiveDate {
    today.succ_opt().unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_start_goes_back_to_monday() {
        // 2024-12-11 is a Wednesday
        assert_eq!(week_start(d(2024, 12, 11)), d(2024, 12, 9));
        assert_eq!(week_start(d(2024, 12, 9)), d(2024, 12, 9));
        // Sunday belongs to the week that started six days earlier
        assert_eq!(week_start(d(2024, 12, 15)), d(2024, 12, 9));
    }

    #[test]
    fn week_start_crosses_month_boundary() {
        // 2025-01-01 is a Wednesday
        assert_eq!(week_start(d(2025, 1, 1)), d(2024, 12, 30));
    }

    #[test]
    fn month_and_year_start() {
        assert_eq!(month_start(d(2024, 2, 29)), d(2024, 2, 1));
        assert_eq!(year_start(d(2024, 7, 15)), d(2024, 1, 1));
    }

    #[test]
    fn fixed_clock_reports_local_date() {
        let local = d(2024, 12, 9).and_hms_opt(12, 0, 0).unwrap();
        let clock = MarketClock::fixed_local(Exchange::default(), local).unwrap();
        assert_eq!(clock.today(), d(2024, 12, 9));
        assert_eq!(clock.now().naive_local(), local);
    }
}
