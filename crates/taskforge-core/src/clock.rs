//! Single source of "now" for the kernel.
//!
//! Every timestamp written to the [`Store`](crate::store::Store) passes through
//! a `Clock`, so tests can swap in [`TestClock`] to make long-poll and
//! kill-cascade timing deterministic.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// A source of UTC timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock: wraps [`Utc::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable, advanceable clock for tests.
#[derive(Clone)]
pub struct TestClock {
    inner: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.inner.lock().expect("test clock lock poisoned") = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.inner.lock().expect("test clock lock poisoned");
        *guard += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.inner.lock().expect("test clock lock poisoned")
    }
}
