//! Periodic cleanup of expired sessions and elapsed rate-limit windows, and
//! deletion of sessions past their retention window.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use crate::rate_limit::RateLimiter;
use crate::session::SessionManager;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired sessions marked revoked.
    pub sessions: u64,
    /// Ended sessions deleted after the retention window.
    pub purged: u64,
    /// Elapsed counter windows dropped.
    pub counters: u64,
}

/// Background task that sweeps on a fixed interval until shut down.
#[derive(Debug, Clone)]
pub struct SessionSweeper {
    sessions: Arc<SessionManager>,
    limiter: Arc<RateLimiter>,
    interval: Duration,
}

impl SessionSweeper {
    /// Creates a sweeper running every `interval`.
    pub fn new(sessions: Arc<SessionManager>, limiter: Arc<RateLimiter>, interval: Duration) -> Self {
        Self {
            sessions,
            limiter,
            interval,
        }
    }

    /// Runs one sweep. A failing step does not skip the others.
    pub async fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        match self.sessions.cleanup_expired_sessions(None).await {
            Ok(count) => report.sessions = count,
            Err(e) => error!(error = %e, "Expired session sweep failed"),
        }
        match self.sessions.purge_ended_sessions().await {
            Ok(count) => report.purged = count,
            Err(e) => error!(error = %e, "Ended session purge failed"),
        }
        match self.limiter.purge_expired().await {
            Ok(count) => report.counters = count,
            Err(e) => error!(error = %e, "Rate-limit purge failed"),
        }

        if report != SweepReport::default() {
            info!(
                sessions = report.sessions,
                purged = report.purged,
                counters = report.counters,
                "Sweep completed"
            );
        }
        report
    }

    /// Spawns the sweep loop. It exits once `shutdown` flips to `true`.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so startup is not a sweep.
            ticker.tick().await;

            info!(interval_secs = self.interval.as_secs(), "Session sweeper started");
            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        self.sweep_once().await;
                    }
                }
            }
            info!("Session sweeper stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use agora_cache::memory::MemoryCounterStore;
    use agora_core::config::{RateLimitConfig, SessionConfig};
    use agora_core::traits::{Clock, ManualClock};
    use agora_database::memory::{MemorySessionRepository, MemoryUserRepository};
    use agora_database::repositories::UserRepository;
    use agora_entity::session::ClientInfo;
    use agora_entity::user::{AccountLevel, User, UserRole};

    use super::*;
    use crate::rate_limit::RateLimitAction;

    fn sweeper(clock: &ManualClock) -> (SessionSweeper, Arc<MemoryUserRepository>) {
        let users = Arc::new(MemoryUserRepository::new());
        let manager = SessionManager::new(
            Arc::new(MemorySessionRepository::new()),
            users.clone(),
            SessionConfig::default(),
            Arc::new(clock.clone()),
        );
        let limiter = RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            RateLimitConfig::default(),
            Arc::new(clock.clone()),
        );
        (
            SessionSweeper::new(Arc::new(manager), Arc::new(limiter), Duration::from_secs(60)),
            users,
        )
    }

    #[tokio::test]
    async fn test_sweep_once_revokes_expired_and_purges_counters() {
        let clock = ManualClock::default();
        let (sweeper, users) = sweeper(&clock);
        let user = User::new("s@example.com", "h", UserRole::Member, AccountLevel::Basic, clock.now());
        users.insert(&user).await.unwrap();

        sweeper.sessions.create_session(&user, &ClientInfo::default()).await.unwrap();
        sweeper.limiter.check(RateLimitAction::Login, "ip").await.unwrap();

        assert_eq!(sweeper.sweep_once().await, SweepReport::default());

        clock.advance(ChronoDuration::hours(25));
        assert_eq!(
            sweeper.sweep_once().await,
            SweepReport {
                sessions: 1,
                purged: 0,
                counters: 1
            }
        );
    }

    #[tokio::test]
    async fn test_sweep_deletes_sessions_past_retention() {
        let clock = ManualClock::default();
        let (sweeper, users) = sweeper(&clock);
        let user = User::new("r@example.com", "h", UserRole::Member, AccountLevel::Basic, clock.now());
        users.insert(&user).await.unwrap();
        let created = sweeper
            .sessions
            .create_session(&user, &ClientInfo::default())
            .await
            .unwrap();

        clock.advance(ChronoDuration::hours(25));
        assert_eq!(sweeper.sweep_once().await.purged, 0);

        // Expired at 24h; retention is a week past that.
        clock.advance(ChronoDuration::hours(24 * 7));
        let report = sweeper.sweep_once().await;
        assert_eq!(report.sessions, 0);
        assert_eq!(report.purged, 1);
        assert!(
            sweeper
                .sessions
                .find_session(created.session.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            sweeper
                .sessions
                .validate_session(&created.token, &ClientInfo::default())
                .await
                .is_none()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_stops_on_shutdown() {
        let clock = ManualClock::default();
        let (sweeper, _) = sweeper(&clock);
        let (tx, rx) = watch::channel(false);

        let handle = sweeper.spawn(rx);
        time::sleep(Duration::from_secs(150)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
