//! Result of a fixed-window rate-limit check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single `check` against a fixed-window counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitOutcome {
    /// Whether the call fits inside the window (`count <= limit`).
    pub success: bool,
    /// Maximum calls allowed per window.
    pub limit: u32,
    /// Calls left in the current window.
    pub remaining: u32,
    /// When the current window closes.
    pub reset_at: DateTime<Utc>,
    /// Seconds from the check until `reset_at`, never below 1.
    pub retry_after: u64,
}

impl RateLimitOutcome {
    /// Builds an outcome checked at `now`, fixing `retry_after` against it.
    pub fn at(
        now: DateTime<Utc>,
        success: bool,
        limit: u32,
        remaining: u32,
        reset_at: DateTime<Utc>,
    ) -> Self {
        Self {
            success,
            limit,
            remaining,
            reset_at,
            retry_after: retry_after_seconds(reset_at, now),
        }
    }

    /// Seconds until the window resets, as seen from `now`.
    pub fn retry_after_seconds_at(&self, now: DateTime<Utc>) -> u64 {
        retry_after_seconds(self.reset_at, now)
    }

    /// Window reset as unix seconds, the form used in `X-RateLimit-Reset`.
    pub fn reset_unix(&self) -> i64 {
        self.reset_at.timestamp()
    }
}

/// Never below 1, so a `Retry-After` header always asks the client to wait.
fn retry_after_seconds(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (reset_at - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_retry_after_rounds_up_and_floors_at_one() {
        let now = Utc::now();
        let outcome =
            RateLimitOutcome::at(now, false, 5, 0, now + Duration::milliseconds(2_100));
        assert_eq!(outcome.retry_after, 3);
        assert_eq!(outcome.retry_after_seconds_at(now), 3);
        assert_eq!(
            outcome.retry_after_seconds_at(now + Duration::seconds(10)),
            1
        );
    }

    #[test]
    fn test_retry_after_is_measured_from_the_check_time() {
        // A check stamped far in the past still reports its own window.
        let checked = Utc::now() - Duration::days(400);
        let outcome = RateLimitOutcome::at(checked, false, 5, 0, checked + Duration::minutes(15));
        assert_eq!(outcome.retry_after, 900);
    }
}
