//! Exchange clock, horizon windows and the session gate.

pub mod clock;
pub mod gate;

pub use clock::{end_after, month_start, week_start, year_start, MarketClock};
pub use gate::{GateVerdict, SessionGate};
