//! Wall-clock access.
//!
//! Every read of "now" or "today" in the study core goes through a [`Clock`],
//! so day rollover, streaks and session timing can be driven by tests.

use std::sync::Mutex;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Timelike, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current local time, with its offset.
    fn now(&self) -> DateTime<FixedOffset>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }

    /// Local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Local hour of day (0-23).
    fn hour(&self) -> u32 {
        self.now().hour()
    }
}

/// The operating system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    /// Stopped at `start`.
    pub const fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
