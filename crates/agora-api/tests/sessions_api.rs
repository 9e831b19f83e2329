//! Device management and password change through the router.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use agora_auth::PasswordHasher;
use agora_core::config::LimitMode;
use agora_entity::user::{AccountLevel, User, UserRole};

use common::{EMAIL, PASSWORD, body_json, build_test_app, build_test_app_with, test_config, with_limit};

#[tokio::test]
async fn test_listing_flags_current_session() {
    let app = build_test_app().await;
    let (first, first_id) = app.login().await;
    let (_second, _) = app.login().await;

    let resp = app.send(Method::GET, "/api/sessions", Some(&first), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rows = body_json(resp).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let current: Vec<_> = rows.iter().filter(|r| r["isCurrent"] == true).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["id"], first_id.as_str());
}

#[tokio::test]
async fn test_listing_is_invalidated_by_new_login() {
    let app = build_test_app().await;
    let (token, _) = app.login().await;

    let resp = app.send(Method::GET, "/api/sessions", Some(&token), None).await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);

    app.login().await;

    let resp = app.send(Method::GET, "/api/sessions", Some(&token), None).await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_soft_limited_listing_still_succeeds() {
    let mut config = test_config();
    with_limit(&mut config, "session_list", 1, LimitMode::Log);
    let app = build_test_app_with(config).await;
    let (token, _) = app.login().await;

    for _ in 0..3 {
        let resp = app.send(Method::GET, "/api/sessions", Some(&token), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let resp = app.send(Method::GET, "/api/sessions", Some(&token), None).await;
    assert_eq!(resp.headers()["x-ratelimit-remaining"], "0");
}

#[tokio::test]
async fn test_sixth_login_evicts_least_recently_active() {
    let mut config = test_config();
    with_limit(&mut config, "login", 100, LimitMode::Block);
    let app = build_test_app_with(config).await;

    let mut tokens = Vec::new();
    for _ in 0..6 {
        app.clock.advance(chrono::Duration::seconds(1));
        tokens.push(app.login().await.0);
    }

    let resp = app
        .send(Method::GET, "/api/sessions", Some(&tokens[5]), None)
        .await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 5);

    let resp = app
        .send(Method::GET, "/api/sessions", Some(&tokens[0]), None)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["reason"], "revoked");
}

#[tokio::test]
async fn test_revoking_foreign_session_is_not_found() {
    let app = build_test_app().await;
    let (token, _) = app.login().await;

    let other = User::new(
        "grace@example.com",
        PasswordHasher::new().hash_password("another password").unwrap(),
        UserRole::Seller,
        AccountLevel::Verified,
        chrono::Utc::now(),
    );
    app.state.repositories.users.insert(&other).await.unwrap();
    let resp = app.login_as("grace@example.com", "another password").await;
    let foreign_id = body_json(resp).await["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!("/api/sessions/{foreign_id}");
    let resp = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let uri = format!("/api/sessions/{}", uuid::Uuid::new_v4());
    let resp = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_revoking_own_session_ends_it() {
    let app = build_test_app().await;
    let (token, _) = app.login().await;
    let (other, other_id) = app.login().await;

    let uri = format!("/api/sessions/{other_id}");
    let resp = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.send(Method::GET, "/api/sessions", Some(&other), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.send(Method::GET, "/api/sessions", Some(&token), None).await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_revoke_all_keeps_current_by_default() {
    let app = build_test_app().await;
    let (token, _) = app.login().await;
    let (other, _) = app.login().await;
    app.login().await;

    let resp = app
        .send(Method::PUT, "/api/sessions", Some(&token), Some(json!({})))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["revoked"], 2);

    let resp = app.send(Method::GET, "/api/sessions", Some(&other), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .send(
            Method::PUT,
            "/api/sessions",
            Some(&token),
            Some(json!({ "keepCurrent": false })),
        )
        .await;
    assert_eq!(body_json(resp).await["revoked"], 1);

    let resp = app.send(Method::GET, "/api/sessions", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_change_revokes_other_sessions() {
    let app = build_test_app().await;
    let (token, _) = app.login().await;
    let (other, _) = app.login().await;

    let resp = app
        .send(
            Method::PUT,
            "/api/users/me/password",
            Some(&token),
            Some(json!({ "currentPassword": "wrong", "newPassword": "a brand new secret" })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .send(
            Method::PUT,
            "/api/users/me/password",
            Some(&token),
            Some(json!({ "currentPassword": PASSWORD, "newPassword": "a brand new secret" })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["revoked"], 1);

    let resp = app.send(Method::GET, "/api/sessions", Some(&other), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = app.send(Method::GET, "/api/sessions", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.login_as(EMAIL, PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = app.login_as(EMAIL, "a brand new secret").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_password_change_is_hard_limited() {
    let mut config = test_config();
    with_limit(&mut config, "password_change", 1, LimitMode::Block);
    let app = build_test_app_with(config).await;
    let (token, _) = app.login().await;

    let body = json!({ "currentPassword": "wrong", "newPassword": "a brand new secret" });
    let resp = app
        .send(Method::PUT, "/api/users/me/password", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .send(Method::PUT, "/api/users/me/password", Some(&token), Some(body))
        .await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key("retry-after"));
}
