//! Session gate: may a calendar date's closing data be shown yet?
//!
//! All comparisons happen in the exchange timezone, whatever timezone the
//! caller's `now` carries.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::Exchange;

/// Why a date is or is not displayable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateVerdict {
    Displayable,
    /// Target date is after today.
    FutureDate,
    /// Target date is today and the session has not closed.
    SessionNotClosed,
}

impl GateVerdict {
    pub fn is_displayable(self) -> bool {
        self == GateVerdict::Displayable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionGate {
    tz: Tz,
    close: NaiveTime,
}

impl SessionGate {
    pub fn new(tz: Tz, close: NaiveTime) -> Self {
        Self { tz, close }
    }

    pub fn for_exchange(exchange: &Exchange) -> Self {
        Self::new(exchange.tz, exchange.close)
    }

    pub fn close_time(&self) -> NaiveTime {
        self.close
    }

    pub fn verdict<Z: TimeZone>(&self, target: NaiveDate, now: &DateTime<Z>) -> GateVerdict {
        let local = now.with_timezone(&self.tz);
        let today = local.date_naive();
        if target > today {
            GateVerdict::FutureDate
        } else if target == today && local.time() < self.close {
            GateVerdict::SessionNotClosed
        } else {
            GateVerdict::Displayable
        }
    }

    pub fn is_displayable<Z: TimeZone>(&self, target: NaiveDate, now: &DateTime<Z>) -> bool {
        self.verdict(target, now).is_displayable()
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::for_exchange(&Exchange::default())
    }
}
