//! Timestamp type used throughout the node.
//!
//! Timestamps are Unix epoch milliseconds (UTC). Election start and
//! confirmation times, telemetry request stamps and representative
//! last-vote times all use this unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Get the current system time as a `Timestamp`.
    ///
    /// A clock set before the Unix epoch reads as `EPOCH`.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    /// Milliseconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whether more than `duration_ms` has passed since this timestamp.
    pub fn is_older_than(&self, duration_ms: u64, now: Timestamp) -> bool {
        self.elapsed_since(now) > duration_ms
    }
}

/// Source of the current time. Injected so time-dependent rules can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_saturates() {
        let later = Timestamp::new(5_000);
        assert_eq!(later.elapsed_since(Timestamp::new(1_000)), 0);
        assert_eq!(Timestamp::new(1_000).elapsed_since(later), 4_000);
    }

    #[test]
    fn older_than_is_strict() {
        let t = Timestamp::from_secs(10);
        assert!(!t.is_older_than(10_000, Timestamp::from_secs(20)));
        assert!(t.is_older_than(10_000, Timestamp::new(20_001)));
    }
}
