//! Application state shared across all handlers and extractors.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use agora_auth::{PasswordHasher, RateLimiter, SessionManager, TokenService};
use agora_cache::{CoalescingCache, CounterStore};
use agora_core::config::AppConfig;
use agora_core::result::AppResult;
use agora_core::traits::Clock;
use agora_database::Repositories;
use agora_entity::session::Session;

/// Per-user active session listings, coalesced across concurrent requests.
pub type SessionListings = CoalescingCache<Uuid, Vec<Session>>;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Time source for every lifecycle decision
    pub clock: Arc<dyn Clock>,
    /// When the process started serving
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Session and user repositories
    pub repositories: Repositories,
    /// Rate-limit counter backend
    pub counters: Arc<dyn CounterStore>,

    // ── Auth ─────────────────────────────────────────────────
    /// Bearer token signing and verification
    pub tokens: Arc<TokenService>,
    /// Session lifecycle
    pub sessions: Arc<SessionManager>,
    /// Per-action rate limiting
    pub rate_limiter: Arc<RateLimiter>,
    /// Argon2id hasher
    pub password_hasher: Arc<PasswordHasher>,

    // ── Caches ───────────────────────────────────────────────
    /// Coalesced `GET /sessions` results
    pub session_listings: Arc<SessionListings>,
}

impl AppState {
    /// Wires services over the given stores.
    pub fn new(
        config: AppConfig,
        repositories: Repositories,
        counters: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let tokens = TokenService::new(&config.auth, Arc::clone(&clock))?;
        let sessions = SessionManager::new(
            Arc::clone(&repositories.sessions),
            Arc::clone(&repositories.users),
            config.session.clone(),
            Arc::clone(&clock),
        );
        let rate_limiter = RateLimiter::new(
            Arc::clone(&counters),
            config.rate_limit.clone(),
            Arc::clone(&clock),
        );
        let session_listings = CoalescingCache::from_config(&config.cache.coalescing);

        Ok(Self {
            config: Arc::new(config),
            clock,
            started_at: Instant::now(),
            repositories,
            counters,
            tokens: Arc::new(tokens),
            sessions: Arc::new(sessions),
            rate_limiter: Arc::new(rate_limiter),
            password_hasher: Arc::new(PasswordHasher::new()),
            session_listings: Arc::new(session_listings),
        })
    }

    /// Drops the cached session listing of `user_id`.
    pub fn invalidate_session_listing(&self, user_id: Uuid) {
        self.session_listings.invalidate(Some(&user_id));
    }
}
