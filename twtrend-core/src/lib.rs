//! twtrend core: Taiwan-listed securities, compared over three horizons.
//!
//! - Domain types (codes, daily bars, series, resolved tickers)
//! - Exchange clock and the session gate that hides unclosed sessions
//! - Bar providers (Yahoo Finance, in-memory/CSV) and the name resolver
//! - Quote snapshot, historical lookup and the weekly/monthly/yearly aligners
//! - Session refresh, CSV export, configuration and logging setup

pub mod config;
pub mod data;
pub mod domain;
pub mod export;
pub mod logging;
pub mod lookup;
pub mod market;
pub mod quote;
pub mod refresh;
pub mod trend;

pub use config::{AppConfig, ConfigError, Exchange};
pub use refresh::{Refresher, SessionSnapshot};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the TUI worker sends across threads is
    /// Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::RawSeries>();
        require_sync::<domain::RawSeries>();
        require_send::<domain::ValidTicker>();
        require_sync::<domain::ValidTicker>();

        require_send::<quote::QuoteBatch>();
        require_sync::<quote::QuoteBatch>();
        require_send::<lookup::HistoryLookup>();
        require_sync::<lookup::HistoryLookup>();
        require_send::<trend::AlignedTable>();
        require_sync::<trend::AlignedTable>();
        require_send::<SessionSnapshot>();
        require_sync::<SessionSnapshot>();
        require_send::<Refresher>();
        require_sync::<Refresher>();

        require_send::<data::NameDirectory>();
        require_sync::<data::NameDirectory>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::MemoryProvider>();
        require_sync::<data::MemoryProvider>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
    }

    /// The aligner seam is object safe; the refresh pipeline selects horizons
    /// through `&dyn TrendAligner`.
    #[test]
    fn trend_aligner_is_object_safe() {
        let aligners = trend::Aligners::default();
        for h in trend::Horizon::ALL {
            let a: &dyn trend::TrendAligner = aligners.get(h);
            assert_eq!(a.horizon(), h);
        }
    }
}
