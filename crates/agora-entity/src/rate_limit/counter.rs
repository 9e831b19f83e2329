//! Fixed-window counter state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One fixed window for a `(scope, action)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitCounter {
    /// Composite key (`action:scope`).
    pub key: String,
    /// Calls recorded in the current window.
    pub count: u64,
    /// When the current window opened.
    pub window_start: DateTime<Utc>,
    /// Window length in milliseconds.
    pub window_duration_ms: i64,
    /// Calls allowed per window.
    pub limit: u32,
}

impl RateLimitCounter {
    /// Opens a fresh window at `now` with no calls recorded yet.
    pub fn open(
        key: impl Into<String>,
        now: DateTime<Utc>,
        window_duration_ms: i64,
        limit: u32,
    ) -> Self {
        Self {
            key: key.into(),
            count: 0,
            window_start: now,
            window_duration_ms,
            limit,
        }
    }

    /// True once `now - window_start >= window_duration_ms`.
    pub fn is_elapsed(&self, now: DateTime<Utc>) -> bool {
        (now - self.window_start).num_milliseconds() >= self.window_duration_ms
    }

    /// When the current window closes.
    pub fn reset_at(&self) -> DateTime<Utc> {
        self.window_start + Duration::milliseconds(self.window_duration_ms)
    }

    /// Records one call, rolling over to a new window first if this one has elapsed.
    pub fn hit(&mut self, now: DateTime<Utc>) {
        if self.is_elapsed(now) {
            self.window_start = now;
            self.count = 0;
        }
        self.count += 1;
    }

    /// Whether the recorded calls still fit the budget.
    pub fn within_limit(&self) -> bool {
        self.count <= u64::from(self.limit)
    }

    /// Calls left in this window.
    pub fn remaining(&self) -> u32 {
        u64::from(self.limit).saturating_sub(self.count) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rolls_over_elapsed_window() {
        let start = Utc::now();
        let mut counter = RateLimitCounter::open("login:10.0.0.1", start, 60_000, 3);

        counter.hit(start);
        counter.hit(start + Duration::seconds(10));
        assert_eq!(counter.count, 2);
        assert_eq!(counter.remaining(), 1);

        counter.hit(start + Duration::seconds(60));
        assert_eq!(counter.count, 1);
        assert_eq!(counter.window_start, start + Duration::seconds(60));
    }

    #[test]
    fn test_within_limit_is_inclusive() {
        let now = Utc::now();
        let mut counter = RateLimitCounter::open("k", now, 1_000, 1);
        counter.hit(now);
        assert!(counter.within_limit());
        counter.hit(now);
        assert!(!counter.within_limit());
        assert_eq!(counter.remaining(), 0);
    }
}
