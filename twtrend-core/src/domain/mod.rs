//! Domain types for twtrend

pub mod bar;
pub mod ticker;

pub use bar::{BarError, DailyBar, RawSeries};
pub use ticker::{parse_code_list, SecurityCode, ValidTicker};
