//! Wall-clock abstraction.
//!
//! Every engine takes the current instant as a method argument; only the
//! service layer holds a clock. [`SystemClock`] reads local time,
//! [`FixedClock`] is a settable instant for tests and simulations.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local};

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Real local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<DateTime<Local>>,
}

impl FixedClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            instant: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Local>) {
        *self.lock() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut instant = self.lock();
        *instant = *instant + by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Local>> {
        // A poisoned instant is still a usable instant.
        self.instant.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        *self.lock()
    }
}
