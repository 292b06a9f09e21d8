//! Process-wide outbound request budget.
//!
//! Two fixed windows are tracked side by side: a short one (default 20 calls
//! per 60 s) and a long one (default 500 calls per 24 h). A window resets when
//! a check lands at or past `window_start + length`; its count never decreases
//! otherwise.
//!
//! Known limitation: fixed windows allow a burst of up to twice the capacity
//! when calls straddle a boundary. A sliding window or token bucket would
//! close that gap.
//!
//! The read-modify-write in [`RequestBudget::check`] runs under a mutex because
//! the tokio multi-thread runtime schedules tasks on parallel workers. The
//! lock is never held across an await. Several processes sharing one upstream
//! quota would need an external atomic counter instead.

use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::clock::{Clock, SystemClock};
use crate::data_source::SourceError;

pub const MINUTE_WINDOW: Duration = Duration::from_secs(60);
pub const DAY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Which of the two windows refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetWindow {
    Minute,
    Day,
}

impl BudgetWindow {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "per-minute",
            Self::Day => "daily",
        }
    }
}

impl Display for BudgetWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetDecision {
    Accepted,
    Rejected(BudgetWindow),
}

impl BudgetDecision {
    pub fn into_result(self) -> Result<(), SourceError> {
        match self {
            Self::Accepted => Ok(()),
            Self::Rejected(window) => Err(SourceError::rate_limited(window)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetConfig {
    pub minute_capacity: u32,
    pub day_capacity: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            minute_capacity: 20,
            day_capacity: 500,
        }
    }
}

/// Counts currently charged against each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSnapshot {
    pub minute_count: u32,
    pub day_count: u32,
}

#[derive(Debug)]
struct WindowCounter {
    count: u32,
    started_at: Instant,
    length: Duration,
    capacity: u32,
}

impl WindowCounter {
    fn new(now: Instant, length: Duration, capacity: u32) -> Self {
        Self {
            count: 0,
            started_at: now,
            length,
            capacity,
        }
    }

    fn roll(&mut self, now: Instant) {
        if now.saturating_duration_since(self.started_at) >= self.length {
            self.count = 0;
            self.started_at = now;
        }
    }

    fn is_full(&self) -> bool {
        self.count >= self.capacity
    }
}

#[derive(Debug)]
struct BudgetInner {
    minute: WindowCounter,
    day: WindowCounter,
}

/// Fixed-window request budget shared by every tool invocation.
#[derive(Debug)]
pub struct RequestBudget {
    clock: Arc<dyn Clock>,
    inner: Mutex<BudgetInner>,
}

impl Default for RequestBudget {
    fn default() -> Self {
        Self::new(BudgetConfig::default())
    }
}

impl RequestBudget {
    pub fn new(config: BudgetConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: BudgetConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            clock,
            inner: Mutex::new(BudgetInner {
                minute: WindowCounter::new(now, MINUTE_WINDOW, config.minute_capacity),
                day: WindowCounter::new(now, DAY_WINDOW, config.day_capacity),
            }),
        }
    }

    /// Charges one request against both windows if neither is full.
    ///
    /// A rejected check leaves both counts untouched.
    pub fn check(&self) -> BudgetDecision {
        let now = self.clock.now();
        let mut inner = self.inner.lock().expect("request budget lock is not poisoned");
        inner.minute.roll(now);
        inner.day.roll(now);

        let rejected = if inner.minute.is_full() {
            Some(BudgetWindow::Minute)
        } else if inner.day.is_full() {
            Some(BudgetWindow::Day)
        } else {
            None
        };

        if let Some(window) = rejected {
            warn!(
                window = window.as_str(),
                minute_count = inner.minute.count,
                day_count = inner.day.count,
                "request budget exhausted"
            );
            return BudgetDecision::Rejected(window);
        }

        inner.minute.count += 1;
        inner.day.count += 1;
        BudgetDecision::Accepted
    }

    /// [`check`](Self::check) mapped onto the error channel.
    pub fn acquire(&self) -> Result<(), SourceError> {
        self.check().into_result()
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        let inner = self.inner.lock().expect("request budget lock is not poisoned");
        BudgetSnapshot {
            minute_count: inner.minute.count,
            day_count: inner.day.count,
        }
    }
}
