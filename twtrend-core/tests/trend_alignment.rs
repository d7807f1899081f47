//! Horizon alignment over in-memory providers.

use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use twtrend_core::data::MemoryProvider;
use twtrend_core::domain::{DailyBar, ValidTicker};
use twtrend_core::trend::{self, Aligners, AlignedTable, Horizon};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn bar(y: i32, m: u32, d: u32, open: f64, close: f64) -> DailyBar {
    DailyBar {
        date: date(y, m, d),
        open,
        high: open.max(close),
        low: open.min(close),
        close,
        volume: 1_000,
    }
}

fn close_bar(y: i32, m: u32, d: u32, close: f64) -> DailyBar {
    bar(y, m, d, close, close)
}

fn taipei(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
    chrono_tz::Asia::Taipei
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
}

fn tickers(codes: &[&str]) -> Vec<ValidTicker> {
    codes
        .iter()
        .map(|c| ValidTicker::new((*c).into(), format!("name-{c}")))
        .collect()
}

fn build(
    horizon: Horizon,
    provider: &MemoryProvider,
    codes: &[&str],
    now: &DateTime<Tz>,
) -> AlignedTable {
    let aligners = Aligners::default();
    trend::build(aligners.get(horizon), provider, &tickers(codes), now)
}

fn approx(actual: Option<f64>, expected: f64) {
    let v = actual.unwrap_or_else(|| panic!("expected {expected}, got null"));
    assert!((v - expected).abs() < 1e-9, "expected {expected}, got {v}");
}

// ── Weekly ───────────────────────────────────────────────────────────

#[test]
fn weekly_monday_and_wednesday_only_leaves_tuesday_null() {
    let provider = MemoryProvider::new()
        .with_series(
            "A",
            vec![
                bar(2024, 12, 6, 5.0, 5.0), // previous week, outside the window
                bar(2024, 12, 9, 10.0, 11.0),
                bar(2024, 12, 11, 12.0, 13.0),
            ],
        )
        .unwrap()
        .with_series(
            "B",
            vec![
                bar(2024, 12, 9, 100.0, 101.0),
                bar(2024, 12, 10, 102.0, 103.0),
                bar(2024, 12, 11, 104.0, 105.0),
            ],
        )
        .unwrap();

    let table = build(Horizon::Weekly, &provider, &["A", "B"], &taipei(2024, 12, 11, 15, 0));

    assert_eq!(
        table.labels(),
        vec![
            "12月9號 週一 09:00",
            "12月9號 週一 13:30",
            "12月10號 週二 09:00",
            "12月10號 週二 13:30",
            "12月11號 週三 09:00",
            "12月11號 週三 13:30",
        ]
    );

    let a = table.column(&"A".into()).unwrap();
    assert_eq!(a.iter().filter(|v| v.is_some()).count(), 4);
    assert_eq!(a[0], Some(0.0));
    approx(a[1], 10.0);
    assert_eq!(a[2], None);
    assert_eq!(a[3], None);
    approx(a[4], 20.0);
    approx(a[5], 30.0);

    let b = table.column(&"B".into()).unwrap();
    assert!(b.iter().all(Option::is_some));
    assert_eq!(b[0], Some(0.0));
}

#[test]
fn weekly_baselines_are_per_security() {
    // B lists on Tuesday; its own first open is its zero point.
    let provider = MemoryProvider::new()
        .with_series("A", vec![bar(2024, 12, 9, 10.0, 10.0), bar(2024, 12, 10, 10.0, 12.0)])
        .unwrap()
        .with_series("B", vec![bar(2024, 12, 10, 50.0, 55.0)])
        .unwrap();

    let table = build(Horizon::Weekly, &provider, &["A", "B"], &taipei(2024, 12, 10, 14, 0));
    assert_eq!(table.value("12月10號 週二 09:00", &"B".into()), Some(0.0));
    approx(table.value("12月10號 週二 13:30", &"B".into()), 10.0);
    assert_eq!(table.value("12月9號 週一 09:00", &"B".into()), None);
}

#[test]
fn weekly_omits_empty_and_failing_securities() {
    let provider = MemoryProvider::new()
        .with_series("A", vec![bar(2024, 12, 9, 10.0, 11.0)])
        .unwrap()
        .with_failure("BROKEN");

    let table = build(
        Horizon::Weekly,
        &provider,
        &["A", "EMPTY", "BROKEN"],
        &taipei(2024, 12, 9, 15, 0),
    );
    assert_eq!(table.columns.len(), 1);
    assert_eq!(table.columns[0].label(), "A name-A");
}

// ── Monthly ──────────────────────────────────────────────────────────

#[test]
fn monthly_uses_first_close_of_month_and_skips_bad_baselines() {
    let provider = MemoryProvider::new()
        .with_series(
            "A",
            vec![
                close_bar(2024, 11, 29, 1.0), // previous month
                close_bar(2024, 12, 2, 100.0),
                close_bar(2024, 12, 3, 90.0),
            ],
        )
        .unwrap()
        .with_series("ZERO", vec![close_bar(2024, 12, 2, 0.0), close_bar(2024, 12, 3, 5.0)])
        .unwrap()
        .with_series("C", vec![close_bar(2024, 12, 3, 20.0), close_bar(2024, 12, 4, 22.0)])
        .unwrap();

    let table = build(
        Horizon::Monthly,
        &provider,
        &["A", "ZERO", "C"],
        &taipei(2024, 12, 4, 16, 0),
    );

    assert!(!table.has_column(&"ZERO".into()));
    assert_eq!(table.labels(), vec!["12/02", "12/03", "12/04"]);
    assert_eq!(table.value("12/02", &"A".into()), Some(0.0));
    approx(table.value("12/03", &"A".into()), -10.0);
    assert_eq!(table.value("12/04", &"A".into()), None);
    assert_eq!(table.value("12/02", &"C".into()), None);
    assert_eq!(table.value("12/03", &"C".into()), Some(0.0));
    approx(table.value("12/04", &"C".into()), 10.0);
}

// ── Yearly ───────────────────────────────────────────────────────────

#[test]
fn yearly_forward_fill_runs_before_coverage_filter() {
    // Four tickers requested; only A and B have data. On 03/04 only A traded:
    // raw coverage is 1/4 (dropped), but B's forward-filled close lifts it to
    // 2/4 (kept). Filtering first would lose 03/04.
    let provider = MemoryProvider::new()
        .with_series("A", vec![close_bar(2024, 3, 1, 100.0), close_bar(2024, 3, 4, 110.0)])
        .unwrap()
        .with_series("B", vec![close_bar(2024, 3, 1, 50.0)])
        .unwrap();

    let table = build(
        Horizon::Yearly,
        &provider,
        &["A", "B", "C", "D"],
        &taipei(2024, 3, 5, 15, 0),
    );

    assert_eq!(table.labels(), vec!["03/01", "03/04"]);
    approx(table.value("03/04", &"A".into()), 10.0);
    assert_eq!(table.value("03/04", &"B".into()), Some(0.0));
}

#[test]
fn yearly_forward_fill_uses_prior_close_on_missing_day() {
    let provider = MemoryProvider::new()
        .with_series(
            "A",
            vec![
                close_bar(2024, 3, 1, 100.0),
                close_bar(2024, 3, 28, 104.0),
                close_bar(2024, 3, 29, 105.0),
            ],
        )
        .unwrap()
        .with_series("B", vec![close_bar(2024, 3, 1, 50.0), close_bar(2024, 3, 28, 55.0)])
        .unwrap();

    let table = build(Horizon::Yearly, &provider, &["A", "B"], &taipei(2024, 4, 2, 15, 0));

    assert_eq!(table.labels(), vec!["03/01", "03/29"]);
    // B has no 03/29 bar; it inherits the 03/28 close of 55.
    approx(table.value("03/29", &"B".into()), 10.0);
    approx(table.value("03/29", &"A".into()), 5.0);
}

#[test]
fn yearly_drops_low_coverage_rows_and_rebases_after_filtering() {
    let codes: Vec<String> = (0..10).map(|i| format!("T{i}")).collect();
    let mut provider = MemoryProvider::new();
    for (i, code) in codes.iter().enumerate() {
        let mut bars = vec![close_bar(2024, 1, 3, 100.0), close_bar(2024, 1, 31, 120.0)];
        if i < 3 {
            // only 3 of 10 securities have 01/02: 70% null, never shown
            bars.push(close_bar(2024, 1, 2, 80.0));
        }
        provider.insert(code.as_str().into(), bars).unwrap();
    }
    let refs: Vec<&str> = codes.iter().map(String::as_str).collect();

    let table = build(Horizon::Yearly, &provider, &refs, &taipei(2024, 2, 5, 15, 0));

    assert_eq!(table.labels(), vec!["01/03", "01/31"]);
    assert_eq!(table.columns.len(), 10);
    // T0 had an 01/02 close of 80, but the baseline is the first kept close.
    assert_eq!(table.value("01/03", &"T0".into()), Some(0.0));
    approx(table.value("01/31", &"T0".into()), 20.0);
}

#[test]
fn yearly_keeps_month_endpoints_only() {
    let mut bars = Vec::new();
    for d in [2, 3, 4, 30, 31] {
        bars.push(close_bar(2024, 1, d, 100.0 + f64::from(d)));
    }
    bars.push(close_bar(2024, 2, 15, 150.0));
    for d in [1, 4, 5] {
        bars.push(close_bar(2024, 3, d, 160.0));
    }
    let provider = MemoryProvider::new().with_series("A", bars).unwrap();

    let table = build(Horizon::Yearly, &provider, &["A"], &taipei(2024, 3, 6, 15, 0));
    assert_eq!(table.labels(), vec!["01/02", "01/31", "02/15", "03/01", "03/05"]);
}

#[test]
fn yearly_trims_unclosed_session_and_zero_volume() {
    let mut zero_volume = close_bar(2024, 12, 10, 999.0);
    zero_volume.volume = 0;
    let provider = MemoryProvider::new()
        .with_series(
            "A",
            vec![
                close_bar(2024, 12, 2, 100.0),
                close_bar(2024, 12, 9, 102.0),
                zero_volume,
                close_bar(2024, 12, 11, 104.0),
            ],
        )
        .unwrap();

    let before_close = build(Horizon::Yearly, &provider, &["A"], &taipei(2024, 12, 11, 10, 0));
    assert_eq!(before_close.labels(), vec!["12/02", "12/09"]);

    let after_close = build(Horizon::Yearly, &provider, &["A"], &taipei(2024, 12, 11, 13, 30));
    assert_eq!(after_close.labels(), vec!["12/02", "12/11"]);
    approx(after_close.value("12/11", &"A".into()), 4.0);
}

#[test]
fn yearly_with_no_data_is_empty() {
    let provider = MemoryProvider::new();
    let table = build(Horizon::Yearly, &provider, &["A", "B"], &taipei(2024, 6, 3, 15, 0));
    assert!(table.is_empty());
    assert_eq!(table.horizon, Horizon::Yearly);
}

#[test]
fn yearly_negative_baseline_is_omitted() {
    let provider = MemoryProvider::new()
        .with_series("NEG", vec![close_bar(2024, 5, 2, -1.0), close_bar(2024, 5, 3, 2.0)])
        .unwrap()
        .with_series("OK", vec![close_bar(2024, 5, 2, 10.0), close_bar(2024, 5, 3, 11.0)])
        .unwrap();
    let table = build(Horizon::Yearly, &provider, &["NEG", "OK"], &taipei(2024, 5, 6, 15, 0));
    assert!(!table.has_column(&"NEG".into()));
    assert!(table.has_column(&"OK".into()));
}

// ── Across horizons ──────────────────────────────────────────────────

#[test]
fn missing_first_price_keeps_the_column_in_every_horizon() {
    let provider = MemoryProvider::new()
        .with_series(
            "2330",
            vec![
                bar(2024, 12, 9, f64::NAN, f64::NAN),
                bar(2024, 12, 10, 100.0, 110.0),
                bar(2024, 12, 11, 100.0, 121.0),
            ],
        )
        .unwrap();
    let now = taipei(2024, 12, 13, 15, 0);

    let weekly = build(Horizon::Weekly, &provider, &["2330"], &now);
    assert_eq!(weekly.columns.len(), 1);
    assert_eq!(weekly.rows.len(), 4);
    approx(weekly.rows[0].values[0], 0.0);
    approx(weekly.rows[3].values[0], 21.0);

    let monthly = build(Horizon::Monthly, &provider, &["2330"], &now);
    assert_eq!(monthly.labels(), vec!["12/10", "12/11"]);
    approx(monthly.value("12/10", &"2330".into()), 0.0);
    approx(monthly.value("12/11", &"2330".into()), 10.0);

    let yearly = build(Horizon::Yearly, &provider, &["2330"], &now);
    assert_eq!(yearly.labels(), vec!["12/10", "12/11"]);
    approx(yearly.value("12/11", &"2330".into()), 10.0);
}
