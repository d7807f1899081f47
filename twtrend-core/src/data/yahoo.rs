//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API. Handles rate limiting,
//! retries with exponential backoff, response parsing, and the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! Listings are addressed as `{code}{suffix}`, e.g. `2330.TW`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use super::circuit_breaker::{CircuitBreaker, Outcome};
use super::provider::{DataError, DataProvider, Period};
use crate::config::{Exchange, ProviderConfig};
use crate::domain::{DailyBar, RawSeries, SecurityCode};

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

impl QuoteData {
    /// Bar at index `i`; `None` when every field is null. Missing prices
    /// become NaN and a missing volume becomes zero.
    fn bar(&self, i: usize, date: NaiveDate) -> Option<DailyBar> {
        let at = |v: &[Option<f64>]| v.get(i).copied().flatten();
        let open = at(&self.open[..]);
        let high = at(&self.high[..]);
        let low = at(&self.low[..]);
        let close = at(&self.close[..]);
        let volume = self.volume.get(i).copied().flatten();
        if [open, high, low, close].iter().all(Option::is_none) && volume.is_none() {
            return None;
        }
        Some(DailyBar {
            date,
            open: open.unwrap_or(f64::NAN),
            high: high.unwrap_or(f64::NAN),
            low: low.unwrap_or(f64::NAN),
            close: close.unwrap_or(f64::NAN),
            volume: volume.unwrap_or(0),
        })
    }
}

/// Result of one HTTP attempt.
enum Attempt {
    Done(RawSeries),
    Retry(DataError),
    Fail(DataError),
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    tz: Tz,
    suffix: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(
        config: &ProviderConfig,
        exchange: &Exchange,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| DataError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            circuit_breaker,
            tz: exchange.tz,
            suffix: exchange.symbol_suffix.clone(),
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
        })
    }

    /// Exchange-local midnight of `date` as a unix timestamp.
    fn local_midnight_ts(&self, date: NaiveDate) -> i64 {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        self.tz
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.timestamp())
            .unwrap_or_else(|| midnight.and_utc().timestamp())
    }

    /// Chart URL for an end-exclusive date range.
    fn range_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = self.local_midnight_ts(start);
        let end_ts = self.local_midnight_ts(end);
        format!("{CHART_BASE}/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d")
    }

    /// Chart URL for a trailing period.
    fn period_url(symbol: &str, period: Period) -> String {
        format!(
            "{CHART_BASE}/{symbol}?range={}&interval=1d",
            period.as_range()
        )
    }

    /// Parse the chart API response into daily bars dated in exchange-local time.
    fn parse_response(
        tz: Tz,
        code: &SecurityCode,
        symbol: &str,
        resp: ChartResponse,
    ) -> Result<RawSeries, DataError> {
        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
            (None, Some(err)) => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(DataError::ResponseFormatChanged(
                    "empty result with no error".into(),
                ))
            }
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A range with no sessions comes back without timestamps.
        let Some(timestamps) = data.timestamp else {
            return Ok(RawSeries::empty(code.clone()));
        };

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.with_timezone(&tz).date_naive())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;
            // all-null rows are non-trading days
            bars.extend(quote.bar(i, date));
        }

        Ok(RawSeries::dedup_last(code.clone(), bars))
    }

    /// Run a chart request, retrying transient failures with exponential backoff.
    fn get_with_retry(&self, code: &SecurityCode, url: &str) -> Result<RawSeries, DataError> {
        let symbol = code.provider_symbol(&self.suffix);
        let mut last_error = DataError::Other("max retries exceeded".into());

        for attempt in 0..=self.max_retries {
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(%symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }
            match self.attempt(code, &symbol, url) {
                Attempt::Done(series) => return Ok(series),
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    /// One HTTP round trip, classified for the retry loop.
    fn attempt(&self, code: &SecurityCode, symbol: &str, url: &str) -> Attempt {
        let resp = match self.client.get(url).send() {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Attempt::Retry(DataError::NetworkUnreachable(e.to_string()))
            }
            Err(e) => return Attempt::Fail(DataError::NetworkUnreachable(e.to_string())),
        };

        match resp.status() {
            StatusCode::FORBIDDEN => {
                warn!(%symbol, "provider returned 403");
                self.circuit_breaker.record(Outcome::Banned);
                Attempt::Fail(DataError::CircuitBreakerTripped)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                self.circuit_breaker.record(Outcome::Transient);
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Attempt::Retry(DataError::RateLimited { retry_after_secs })
            }
            StatusCode::UNAUTHORIZED => Attempt::Fail(DataError::AuthenticationRequired(
                "Yahoo Finance requires authentication".into(),
            )),
            // Unknown symbols come back as 404 with a JSON error body.
            StatusCode::NOT_FOUND => Attempt::Fail(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
            status if !status.is_success() => {
                self.circuit_breaker.record(Outcome::Transient);
                Attempt::Retry(DataError::Other(format!("HTTP {status} for {symbol}")))
            }
            _ => {
                let parsed = resp
                    .json::<ChartResponse>()
                    .map_err(|e| {
                        DataError::ResponseFormatChanged(format!("{symbol}: {e}"))
                    })
                    .and_then(|chart| Self::parse_response(self.tz, code, symbol, chart));
                match parsed {
                    Ok(series) => {
                        self.circuit_breaker.record(Outcome::Success);
                        Attempt::Done(series)
                    }
                    Err(e) => Attempt::Fail(e),
                }
            }
        }
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        code: &SecurityCode,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, DataError> {
        if start >= end {
            return Ok(RawSeries::empty(code.clone()));
        }
        let url = self.range_url(&code.provider_symbol(&self.suffix), start, end);
        let series = self.get_with_retry(code, &url)?;
        // period2 is inclusive upstream; keep the contract end-exclusive
        Ok(series.window(start, end))
    }

    fn fetch_period(&self, code: &SecurityCode, period: Period) -> Result<RawSeries, DataError> {
        let url = Self::period_url(&code.provider_symbol(&self.suffix), period);
        self.get_with_retry(code, &url)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> YahooProvider {
        YahooProvider::new(
            &ProviderConfig::default(),
            &Exchange::default(),
            Arc::new(CircuitBreaker::new(Duration::from_secs(60), 3)),
        )
        .unwrap()
    }

    fn parse(json: &str) -> Result<RawSeries, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response(
            chrono_tz::Asia::Taipei,
            &"2330".into(),
            "2330.TW",
            resp,
        )
    }

    #[test]
    fn range_url_uses_exchange_midnight() {
        let p = provider();
        let url = p.range_url(
            "2330.TW",
            NaiveDate::from_ymd_opt(2024, 12, 9).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 10).unwrap(),
        );
        // 2024-12-09T00:00+08:00 == 2024-12-08T16:00Z
        assert!(url.contains("period1=1733673600"), "{url}");
        assert!(url.contains("period2=1733760000"), "{url}");
        assert!(url.contains("/2330.TW?"));
    }

    #[test]
    fn period_url_uses_range() {
        let url = YahooProvider::period_url("0050.TW", Period::TradingDays(5));
        assert!(url.ends_with("/0050.TW?range=5d&interval=1d"));
    }

    #[test]
    fn parses_bars_in_exchange_dates() {
        // 01:00 UTC is 09:00 in Taipei on the same day
        let json = r#"{"chart":{"result":[{"timestamp":[1733706000,1733792400],
            "indicators":{"quote":[{"open":[1070.0,1080.0],"high":[1085.0,1090.0],
            "low":[1065.0,1075.0],"close":[1080.0,1085.0],"volume":[25000000,0]}]}}],"error":null}}"#;
        let series = parse(json).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.bars()[0].date,
            NaiveDate::from_ymd_opt(2024, 12, 9).unwrap()
        );
        assert_eq!(series.bars()[1].volume, 0);
    }

    #[test]
    fn skips_all_null_rows() {
        let json = r#"{"chart":{"result":[{"timestamp":[1733706000,1733792400],
            "indicators":{"quote":[{"open":[null,1080.0],"high":[null,1090.0],
            "low":[null,1075.0],"close":[null,1085.0],"volume":[null,100]}]}}],"error":null}}"#;
        let series = parse(json).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].close, 1085.0);
    }

    #[test]
    fn missing_timestamps_is_an_empty_series() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        let series = parse(json).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        match parse(json) {
            Err(DataError::SymbolNotFound { symbol }) => assert_eq!(symbol, "2330.TW"),
            other => panic!("expected SymbolNotFound, got {other:?}"),
        }
    }

    #[test]
    fn tripped_breaker_refuses_without_network() {
        let breaker = Arc::new(CircuitBreaker::new(Duration::from_secs(60), 3));
        breaker.record(Outcome::Banned);
        let p = YahooProvider::new(&ProviderConfig::default(), &Exchange::default(), breaker)
            .unwrap();
        assert!(!p.is_available());
        let err = p
            .fetch_period(&"2330".into(), Period::TradingDays(5))
            .unwrap_err();
        assert!(matches!(err, DataError::CircuitBreakerTripped));
    }
}
