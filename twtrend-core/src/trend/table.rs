//! Aligned date x security tables of percentage returns.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{RawSeries, SecurityCode, ValidTicker};

/// Lookback window and alignment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Weekly,
    Monthly,
    Yearly,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::Weekly, Horizon::Monthly, Horizon::Yearly];

    /// Panel / section heading.
    pub fn title(self) -> &'static str {
        match self {
            Horizon::Weekly => "本週走勢比較 (每日 09:00 與 13:30)",
            Horizon::Monthly => "本月走勢比較 (每日收盤)",
            Horizon::Yearly => "今年每月走勢比較 (月初與月底)",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Horizon::Weekly => "weekly",
            Horizon::Monthly => "monthly",
            Horizon::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Horizon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" | "w" => Ok(Horizon::Weekly),
            "monthly" | "month" | "m" => Ok(Horizon::Monthly),
            "yearly" | "year" | "ytd" | "y" => Ok(Horizon::Yearly),
            other => Err(format!("unknown horizon '{other}'")),
        }
    }
}

/// One timestamp of an aligned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    /// Exchange-local timestamp of the observation.
    pub at: NaiveDateTime,
    /// Display label for the x axis.
    pub label: String,
    /// One return per column, `None` where the security has no observation.
    pub values: Vec<Option<f64>>,
}

/// Percentage returns for several securities on a shared, ascending time axis.
///
/// Each column holds returns relative to that security's own baseline, so its
/// baseline point reads exactly `0.0`. Securities without a usable baseline
/// have no column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    pub horizon: Horizon,
    pub columns: Vec<ValidTicker>,
    pub rows: Vec<AlignedRow>,
}

impl AlignedTable {
    pub fn empty(horizon: Horizon) -> Self {
        Self {
            horizon,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// No columns or no rows: nothing to chart.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn column_index(&self, code: &SecurityCode) -> Option<usize> {
        self.columns.iter().position(|t| &t.code == code)
    }

    pub fn has_column(&self, code: &SecurityCode) -> bool {
        self.column_index(code).is_some()
    }

    /// All cells for one security, top to bottom.
    pub fn column(&self, code: &SecurityCode) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(code)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Cell at the row with this label.
    pub fn value(&self, label: &str, code: &SecurityCode) -> Option<f64> {
        let idx = self.column_index(code)?;
        self.rows
            .iter()
            .find(|r| r.label == label)
            .and_then(|r| r.values[idx])
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    /// (row index, value) pairs of one column, nulls skipped. Chart input.
    pub fn points(&self, column: usize) -> Vec<(f64, f64)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.values.get(column).copied().flatten().map(|v| (i as f64, v)))
            .collect()
    }

    /// Smallest and largest value across all cells.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .flat_map(|r| r.values.iter().flatten().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// A fetched series paired with its resolved ticker.
#[derive(Debug, Clone)]
pub struct LabeledSeries {
    pub ticker: ValidTicker,
    pub series: RawSeries,
}

impl LabeledSeries {
    pub fn new(ticker: ValidTicker, series: RawSeries) -> Self {
        Self { ticker, series }
    }
}

/// A baseline must be a positive, finite price.
pub fn usable_baseline(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// `(price - baseline) / baseline * 100`.
pub fn pct_change(price: f64, baseline: f64) -> f64 {
    (price - baseline) / baseline * 100.0
}

/// Outer-union merge of per-security point series. Missing timestamps become
/// `None`; nothing is filled.
pub(crate) fn merge_outer(
    horizon: Horizon,
    columns: Vec<(ValidTicker, Vec<(NaiveDateTime, f64)>)>,
    label: impl Fn(&NaiveDateTime) -> String,
) -> AlignedTable {
    let width = columns.len();
    let mut grid: BTreeMap<NaiveDateTime, Vec<Option<f64>>> = BTreeMap::new();
    for (col, (_, points)) in columns.iter().enumerate() {
        for (at, value) in points {
            grid.entry(*at).or_insert_with(|| vec![None; width])[col] = Some(*value);
        }
    }

    AlignedTable {
        horizon,
        columns: columns.into_iter().map(|(t, _)| t).collect(),
        rows: grid
            .into_iter()
            .map(|(at, values)| AlignedRow {
                label: label(&at),
                at,
                values,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn ticker(code: &str) -> ValidTicker {
        ValidTicker::new(code.into(), code)
    }

    #[test]
    fn merge_is_outer_union_without_fill() {
        let table = merge_outer(
            Horizon::Monthly,
            vec![
                (ticker("A"), vec![(at(2, 13), 0.0), (at(4, 13), 1.0)]),
                (ticker("B"), vec![(at(3, 13), 0.0)]),
            ],
            |dt| dt.format("%m/%d").to_string(),
        );
        assert_eq!(table.labels(), vec!["12/02", "12/03", "12/04"]);
        assert_eq!(
            table.column(&"A".into()).unwrap(),
            vec![Some(0.0), None, Some(1.0)]
        );
        assert_eq!(table.column(&"B".into()).unwrap(), vec![None, Some(0.0), None]);
        assert_eq!(table.value("12/04", &"A".into()), Some(1.0));
        assert_eq!(table.value_bounds(), Some((0.0, 1.0)));
        assert_eq!(table.points(1), vec![(1.0, 0.0)]);
    }

    #[test]
    fn horizon_parses_aliases() {
        assert_eq!("Weekly".parse::<Horizon>().unwrap(), Horizon::Weekly);
        assert_eq!("ytd".parse::<Horizon>().unwrap(), Horizon::Yearly);
        assert!("daily".parse::<Horizon>().is_err());
    }

    #[test]
    fn baseline_rules() {
        assert!(usable_baseline(10.0));
        assert!(!usable_baseline(0.0));
        assert!(!usable_baseline(-1.0));
        assert!(!usable_baseline(f64::NAN));
        assert!((pct_change(110.0, 100.0) - 10.0).abs() < 1e-9);
        assert_eq!(pct_change(100.0, 100.0), 0.0);
    }
}
