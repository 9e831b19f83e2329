//! Fixed-window limiter over a [`CounterStore`].

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use agora_cache::CounterStore;
use agora_cache::keys;
use agora_core::config::{ActionLimitConfig, LimitMode, RateLimitConfig};
use agora_core::error::AppError;
use agora_core::result::AppResult;
use agora_core::traits::Clock;
use agora_core::types::RateLimitOutcome;

use super::action::RateLimitAction;

/// Counts calls per `(action, scope)` in fixed windows.
///
/// `check` only reports; `enforce` applies the action's mode. Block-mode
/// actions reject over-limit calls, log-mode actions let them through
/// with a warning.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish()
    }
}

impl RateLimiter {
    /// Creates a limiter backed by `store`.
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// Budget configured for `action`.
    pub fn budget(&self, action: RateLimitAction) -> ActionLimitConfig {
        self.config.action(action.as_str())
    }

    /// Records one call of `action` for `scope` and reports the window.
    pub async fn check(&self, action: RateLimitAction, scope: &str) -> AppResult<RateLimitOutcome> {
        self.check_with(action.as_str(), self.budget(action), scope)
            .await
    }

    /// Records one call under an explicit budget.
    ///
    /// The first call of a window leaves the count at 1; `success` is
    /// `count <= points`.
    pub async fn check_with(
        &self,
        action: &str,
        budget: ActionLimitConfig,
        scope: &str,
    ) -> AppResult<RateLimitOutcome> {
        let now = self.clock.now();
        if !self.config.enabled {
            return Ok(RateLimitOutcome::at(
                now,
                true,
                budget.points,
                budget.points,
                now + Duration::milliseconds(budget.window_ms()),
            ));
        }

        let key = keys::rate_limit(action, scope);
        let counter = self
            .store
            .hit(&key, now, budget.window_ms(), budget.points)
            .await?;

        debug!(key = %key, count = counter.count, limit = budget.points, "Rate-limit check");
        Ok(RateLimitOutcome::at(
            now,
            counter.within_limit(),
            budget.points,
            counter.remaining(),
            counter.reset_at(),
        ))
    }

    /// Checks `action` and applies its mode.
    ///
    /// Block mode returns a `RateLimited` error carrying the window once the
    /// budget is spent. Log mode only warns, and also lets the call through
    /// when the counter store is unreachable.
    pub async fn enforce(&self, action: RateLimitAction, scope: &str) -> AppResult<RateLimitOutcome> {
        let budget = self.budget(action);
        let outcome = match self.check_with(action.as_str(), budget, scope).await {
            Ok(outcome) => outcome,
            Err(e) if budget.mode == LimitMode::Log => {
                warn!(action = %action, error = %e, "Rate-limit store unavailable, allowing request");
                let now = self.clock.now();
                return Ok(RateLimitOutcome::at(
                    now,
                    true,
                    budget.points,
                    budget.points,
                    now + Duration::milliseconds(budget.window_ms()),
                ));
            }
            Err(e) => return Err(e),
        };

        if outcome.success {
            return Ok(outcome);
        }

        match budget.mode {
            LimitMode::Block => {
                warn!(action = %action, scope = %scope, limit = outcome.limit, "Rate limit exceeded, blocking");
                Err(AppError::rate_limited(outcome))
            }
            LimitMode::Log => {
                warn!(action = %action, scope = %scope, limit = outcome.limit, "Rate limit exceeded");
                Ok(outcome)
            }
        }
    }

    /// Clears the window for `action` and `scope`.
    pub async fn reset(&self, action: RateLimitAction, scope: &str) -> AppResult<()> {
        self.store
            .reset(&keys::rate_limit(action.as_str(), scope))
            .await
    }

    /// Drops elapsed windows from the store.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.store.purge_expired(self.clock.now()).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use agora_cache::memory::MemoryCounterStore;
    use agora_core::error::ErrorKind;
    use agora_core::traits::ManualClock;

    use super::*;

    fn limiter(clock: &ManualClock) -> RateLimiter {
        RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            RateLimitConfig::default(),
            Arc::new(clock.clone()),
        )
    }

    const THREE_PER_MINUTE: ActionLimitConfig = ActionLimitConfig {
        points: 3,
        window_seconds: 60,
        mode: LimitMode::Block,
    };

    #[tokio::test]
    async fn test_fixed_window_resets_after_elapsing() {
        let clock = ManualClock::default();
        let limiter = limiter(&clock);

        for expected_remaining in [2, 1, 0] {
            let outcome = limiter.check_with("search", THREE_PER_MINUTE, "ip").await.unwrap();
            assert!(outcome.success);
            assert_eq!(outcome.remaining, expected_remaining);
        }
        let fourth = limiter.check_with("search", THREE_PER_MINUTE, "ip").await.unwrap();
        assert!(!fourth.success);
        assert_eq!(fourth.limit, 3);

        clock.advance(Duration::seconds(60));
        let fresh = limiter.check_with("search", THREE_PER_MINUTE, "ip").await.unwrap();
        assert!(fresh.success);
        assert_eq!(fresh.remaining, 2);
        assert_eq!(fresh.reset_at, clock.now() + Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_scopes_and_actions_are_independent() {
        let clock = ManualClock::default();
        let limiter = limiter(&clock);
        for _ in 0..3 {
            limiter.check_with("search", THREE_PER_MINUTE, "a").await.unwrap();
        }
        assert!(limiter.check_with("search", THREE_PER_MINUTE, "b").await.unwrap().success);
        assert!(limiter.check_with("other", THREE_PER_MINUTE, "a").await.unwrap().success);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_checks_count_both() {
        let clock = ManualClock::default();
        let limiter = limiter(&clock);

        let (a, b) = tokio::join!(
            limiter.check_with("search", THREE_PER_MINUTE, "ip"),
            limiter.check_with("search", THREE_PER_MINUTE, "ip"),
        );
        let mut remaining = [a.unwrap().remaining, b.unwrap().remaining];
        remaining.sort();
        assert_eq!(remaining, [1, 2]);
    }

    #[tokio::test]
    async fn test_block_mode_rejects_with_window() {
        let clock = ManualClock::default();
        let limiter = limiter(&clock);

        for _ in 0..5 {
            limiter.enforce(RateLimitAction::Login, "10.0.0.1").await.unwrap();
        }
        let err = limiter
            .enforce(RateLimitAction::Login, "10.0.0.1")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        let window = err.rate_limit.unwrap();
        assert_eq!(window.remaining, 0);
        assert_eq!(window.retry_after, 900);
    }

    #[tokio::test]
    async fn test_log_mode_lets_overruns_through() {
        let clock = ManualClock::default();
        let limiter = limiter(&clock);
        let budget = limiter.budget(RateLimitAction::SessionList);

        for _ in 0..budget.points {
            limiter.enforce(RateLimitAction::SessionList, "user").await.unwrap();
        }
        let over = limiter
            .enforce(RateLimitAction::SessionList, "user")
            .await
            .unwrap();
        assert!(!over.success);
        assert_eq!(over.remaining, 0);
    }

    #[tokio::test]
    async fn test_disabled_limiter_never_counts() {
        let clock = ManualClock::default();
        let limiter = RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            RateLimitConfig {
                enabled: false,
                actions: HashMap::new(),
            },
            Arc::new(clock.clone()),
        );
        for _ in 0..10 {
            assert!(limiter.enforce(RateLimitAction::Login, "ip").await.unwrap().success);
        }
    }

    #[tokio::test]
    async fn test_reset_and_purge() {
        let clock = ManualClock::default();
        let limiter = limiter(&clock);
        for _ in 0..5 {
            limiter.enforce(RateLimitAction::Login, "ip").await.unwrap();
        }
        limiter.reset(RateLimitAction::Login, "ip").await.unwrap();
        assert!(limiter.enforce(RateLimitAction::Login, "ip").await.unwrap().success);

        clock.advance(Duration::minutes(16));
        assert_eq!(limiter.purge_expired().await.unwrap(), 1);
    }
}
