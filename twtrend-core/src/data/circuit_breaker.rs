//! Circuit breaker shared by every request a provider makes.
//!
//! A ban (HTTP 403) opens the breaker at once. Transient failures (429, 5xx)
//! open it after `failure_threshold` in a row. While open, every request is
//! refused until the cooldown has elapsed.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::config::ProviderConfig;

/// How one provider response should move the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Rate limited or server error; counts towards the threshold.
    Transient,
    /// Forbidden; opens immediately.
    Banned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed { failures: u32 },
    Open { since: Instant },
}

#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u32) -> Self {
        Self {
            state: Mutex::new(BreakerState::Closed { failures: 0 }),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.breaker_cooldown(), config.breaker_failure_threshold)
    }

    // A panic while holding the lock leaves a valid state value behind.
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state, after closing an expired cooldown.
    pub fn state(&self) -> BreakerState {
        let mut state = self.lock();
        if let BreakerState::Open { since } = *state {
            if since.elapsed() >= self.cooldown {
                *state = BreakerState::Closed { failures: 0 };
            }
        }
        *state
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self.state(), BreakerState::Closed { .. })
    }

    pub fn record(&self, outcome: Outcome) {
        let mut state = self.lock();
        let next = match (outcome, *state) {
            (Outcome::Success, _) => BreakerState::Closed { failures: 0 },
            (Outcome::Banned, _) => BreakerState::Open { since: Instant::now() },
            (Outcome::Transient, BreakerState::Closed { failures })
                if failures + 1 >= self.failure_threshold =>
            {
                BreakerState::Open { since: Instant::now() }
            }
            (Outcome::Transient, BreakerState::Closed { failures }) => {
                BreakerState::Closed { failures: failures + 1 }
            }
            (Outcome::Transient, open @ BreakerState::Open { .. }) => open,
        };
        if matches!(next, BreakerState::Open { .. }) && matches!(*state, BreakerState::Closed { .. }) {
            warn!(?outcome, cooldown = ?self.cooldown, "circuit breaker opened");
        }
        *state = next;
    }

    /// Time until requests are allowed again; zero when closed.
    pub fn remaining_cooldown(&self) -> Duration {
        match self.state() {
            BreakerState::Closed { .. } => Duration::ZERO,
            BreakerState::Open { since } => self.cooldown.saturating_sub(since.elapsed()),
        }
    }
}
