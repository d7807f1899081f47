//! In-memory bar provider, optionally loaded from a CSV file.
//!
//! CSV layout (header required):
//!
//! ```text
//! code,date,open,high,low,close,volume
//! 2330,2024-12-09,1070,1085,1065,1080,25000000
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, DataProvider, Period};
use crate::domain::{DailyBar, RawSeries, SecurityCode};

#[derive(Debug, Deserialize)]
struct CsvBar {
    code: String,
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Serves bars from memory. Codes listed as failing return a network error,
/// which lets callers exercise per-security failure handling.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    series: BTreeMap<SecurityCode, RawSeries>,
    failing: HashSet<SecurityCode>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bars for a code, replacing any earlier series.
    pub fn insert(&mut self, code: SecurityCode, bars: Vec<DailyBar>) -> Result<(), DataError> {
        let series = RawSeries::new(code.clone(), bars)
            .map_err(|e| DataError::Other(e.to_string()))?;
        self.series.insert(code, series);
        Ok(())
    }

    pub fn with_series(mut self, code: &str, bars: Vec<DailyBar>) -> Result<Self, DataError> {
        self.insert(SecurityCode::from(code), bars)?;
        Ok(self)
    }

    /// Make every fetch for `code` fail with a network error.
    pub fn with_failure(mut self, code: &str) -> Self {
        self.failing.insert(SecurityCode::from(code));
        self
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, DataError> {
        let file = std::fs::File::open(path).map_err(|e| DataError::BarFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_csv_reader(file).map_err(|e| match e {
            DataError::BarFile { reason, .. } => DataError::BarFile {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self, DataError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut grouped: BTreeMap<SecurityCode, Vec<DailyBar>> = BTreeMap::new();

        for (line, record) in rdr.deserialize::<CsvBar>().enumerate() {
            let row = record.map_err(|e| DataError::BarFile {
                path: "<reader>".into(),
                reason: format!("row {}: {e}", line + 1),
            })?;
            let Some(code) = SecurityCode::parse(&row.code) else {
                continue;
            };
            grouped.entry(code).or_default().push(DailyBar {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        let mut provider = Self::new();
        for (code, bars) in grouped {
            provider.insert(code, bars)?;
        }
        Ok(provider)
    }

    pub fn codes(&self) -> impl Iterator<Item = &SecurityCode> {
        self.series.keys()
    }

    fn check(&self, code: &SecurityCode) -> Result<(), DataError> {
        if self.failing.contains(code) {
            return Err(DataError::NetworkUnreachable(format!(
                "simulated failure for {code}"
            )));
        }
        Ok(())
    }
}

impl DataProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(
        &self,
        code: &SecurityCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, DataError> {
        self.check(code)?;
        Ok(self
            .series
            .get(code)
            .map(|s| s.window(start, end))
            .unwrap_or_else(|| RawSeries::empty(code.clone())))
    }

    fn fetch_period(&self, code: &SecurityCode, period: Period) -> Result<RawSeries, DataError> {
        self.check(code)?;
        let Period::TradingDays(n) = period;
        Ok(self
            .series
            .get(code)
            .map(|s| s.tail(n as usize))
            .unwrap_or_else(|| RawSeries::empty(code.clone())))
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "code,date,open,high,low,close,volume
2330, 2024-12-09, 1070, 1085, 1065, 1080, 25000000
2330, 2024-12-10, 1080, 1090, 1075, 1085, 21000000
2317, 2024-12-09, 200, 205, 198, 203, 50000000
";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn loads_grouped_by_code() {
        let p = MemoryProvider::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(p.codes().count(), 2);
        let s = p
            .fetch(&"2330".into(), d(2024, 12, 1), d(2024, 12, 31))
            .unwrap();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn fetch_is_end_exclusive() {
        let p = MemoryProvider::from_csv_reader(CSV.as_bytes()).unwrap();
        let s = p
            .fetch(&"2330".into(), d(2024, 12, 9), d(2024, 12, 10))
            .unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.bars()[0].close, 1080.0);
    }

    #[test]
    fn unknown_code_is_empty_not_error() {
        let p = MemoryProvider::from_csv_reader(CSV.as_bytes()).unwrap();
        let s = p.fetch_period(&"9999".into(), Period::TradingDays(5)).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn failing_code_errors() {
        let p = MemoryProvider::new().with_failure("2330");
        assert!(p.fetch_period(&"2330".into(), Period::TradingDays(5)).is_err());
    }

    #[test]
    fn duplicate_rows_are_rejected() {
        let csv = "code,date,open,high,low,close,volume\n2330,2024-12-09,1,1,1,1,1\n2330,2024-12-09,2,2,2,2,2\n";
        assert!(MemoryProvider::from_csv_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn bad_row_reports_line() {
        let csv = "code,date,open,high,low,close,volume\n2330,not-a-date,1,1,1,1,1\n";
        match MemoryProvider::from_csv_reader(csv.as_bytes()) {
            Err(DataError::BarFile { reason, .. }) => assert!(reason.starts_with("row 1")),
            other => panic!("expected BarFile error, got {other:?}"),
        }
    }
}
