//! Shared helpers for router-level tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, Response, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use agora_api::{AppState, build_app};
use agora_auth::PasswordHasher;
use agora_cache::memory::MemoryCounterStore;
use agora_cache::{CounterManager, CounterStore};
use agora_core::config::{ActionLimitConfig, AppConfig, LimitMode};
use agora_core::traits::{Clock, ManualClock};
use agora_database::Repositories;
use agora_entity::user::{AccountLevel, User, UserRole};

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "correct horse battery";

/// A router over in-memory stores with one registered user.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: ManualClock,
    pub user: User,
}

/// Baseline configuration for tests.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "test-secret-that-is-at-least-32-bytes".to_string();
    config
}

/// Overrides one action's budget.
pub fn with_limit(config: &mut AppConfig, action: &str, points: u32, mode: LimitMode) {
    config.rate_limit.actions.insert(
        action.to_string(),
        ActionLimitConfig {
            points,
            window_seconds: 60,
            mode,
        },
    );
}

pub async fn build_test_app() -> TestApp {
    build_test_app_with(test_config()).await
}

pub async fn build_test_app_with(config: AppConfig) -> TestApp {
    let clock = ManualClock::new(Utc::now());
    let repositories = Repositories::in_memory();
    let counters: Arc<dyn CounterStore> = Arc::new(CounterManager::from_store(Arc::new(
        MemoryCounterStore::new(),
    )));

    let hash = PasswordHasher::new().hash_password(PASSWORD).unwrap();
    let user = User::new(EMAIL, hash, UserRole::Member, AccountLevel::Basic, clock.now());
    repositories.users.insert(&user).await.unwrap();

    let state = AppState::new(
        config,
        repositories,
        counters,
        Arc::new(clock.clone()) as Arc<dyn Clock>,
    )
    .unwrap();

    TestApp {
        router: build_app(state.clone()),
        state,
        clock,
        user,
    }
}

impl TestApp {
    /// Sends a request from `ip`, optionally authenticated.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let mut req = builder.body(body).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 4], 50000))));

        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Logs in with the given credentials and returns the raw response.
    pub async fn login_as(&self, email: &str, password: &str) -> Response<Body> {
        self.send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(serde_json::json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Logs in as the seeded user and returns `(token, session_id)`.
    pub async fn login(&self) -> (String, String) {
        let resp = self.login_as(EMAIL, PASSWORD).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        (
            body["token"].as_str().unwrap().to_string(),
            body["sessionId"].as_str().unwrap().to_string(),
        )
    }
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
