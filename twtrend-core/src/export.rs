//! CSV export for spreadsheet users.
//!
//! Output is UTF-8 with a leading byte-order mark so spreadsheet programs pick
//! the right encoding for the zh-TW headers.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::quote::QuoteRow;
use crate::trend::AlignedTable;

pub const BOM: &str = "\u{FEFF}";

pub const QUOTE_HEADERS: [&str; 7] = ["代號", "名稱", "日期", "收盤價", "漲跌", "漲跌幅(%)", "成交量"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer flush failed: {0}")]
    Flush(String),

    #[error("csv output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `stock_YYYYMMDD.csv` for the given exchange-local date.
pub fn default_filename(date: NaiveDate) -> String {
    format!("stock_{}.csv", date.format("%Y%m%d"))
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(format!("{BOM}{}", String::from_utf8(data)?))
}

// ─── Quote table ────────────────────────────────────────────────────

pub fn quotes_csv(rows: &[QuoteRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(QUOTE_HEADERS)?;
    for r in rows {
        wtr.write_record([
            r.code.as_str(),
            &r.name,
            &r.date.format("%Y-%m-%d").to_string(),
            &format!("{:.2}", r.close),
            &format!("{:.2}", r.change),
            &format!("{:.2}", r.change_pct),
            &r.volume.to_string(),
        ])?;
    }
    finish(wtr)
}

// ─── Aligned tables ─────────────────────────────────────────────────

/// `日期` then one column per security label; null cells are empty.
pub fn table_csv(table: &AlignedTable) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["日期".to_string()];
    header.extend(table.columns.iter().map(|t| t.label()));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.label.clone());
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|x| format!("{x:.2}")).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    finish(wtr)
}

pub fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the quote table to `path`, or to the default filename inside `dir`.
pub fn export_quotes(
    rows: &[QuoteRow],
    dir: &Path,
    path: Option<&Path>,
    today: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let target = match path {
        Some(p) => p.to_path_buf(),
        None => dir.join(default_filename(today)),
    };
    write_file(&target, &quotes_csv(rows)?)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_embeds_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 9).unwrap();
        assert_eq!(default_filename(date), "stock_20241209.csv");
    }

    #[test]
    fn empty_quote_table_still_has_bom_and_header() {
        let csv = quotes_csv(&[]).unwrap();
        assert!(csv.starts_with(BOM));
        assert_eq!(csv.trim_start_matches(BOM).trim_end(), QUOTE_HEADERS.join(","));
    }
}
