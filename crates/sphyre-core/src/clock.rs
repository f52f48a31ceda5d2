//! Authoritative time source for expiry and audit timestamps.
//!
//! Every ledger in a registry reads "now" from one shared [`Clock`] so that
//! expiry checks agree across components.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::Timestamp;

/// Source of the current time in seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch system time clamps to 0.
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Manually driven clock for deterministic tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `secs` and return the new time. Saturates at `u64::MAX`.
    pub fn advance(&self, secs: u64) -> Timestamp {
        let step = |t: u64| Some(t.saturating_add(secs));
        match self.now.fetch_update(Ordering::SeqCst, Ordering::SeqCst, step) {
            Ok(prev) | Err(prev) => prev.saturating_add(secs),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
