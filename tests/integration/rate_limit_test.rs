//! Integration tests for per-principal admission control.

use std::time::Duration;

use axum::http::StatusCode;

use gatekeeper_api::middleware::rate_limit::{REMAINING_HEADER, RETRY_AFTER_HEADER};
use gatekeeper_auth::Role;
use gatekeeper_core::config::AppConfig;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_anonymous_burst_is_capped_at_capacity() {
    let app = TestApp::new();

    for expected in [4, 3, 2, 1, 0] {
        let resp = app.get("/api/ping", None).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.header_u64(REMAINING_HEADER), Some(expected));
        assert_eq!(resp.body["data"]["pong"], true);
    }

    let rejected = app.get("/api/ping", None).await;
    assert_eq!(rejected.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(rejected.header_u64(RETRY_AFTER_HEADER), Some(12));
    assert!(rejected.headers.get(REMAINING_HEADER).is_none());
    assert_eq!(rejected.body["error"], "RATE_LIMITED");
    assert_eq!(rejected.body["details"]["retry_after_seconds"], 12);
}

#[tokio::test]
async fn test_rejected_caller_is_readmitted_after_retry_after() {
    let app = TestApp::new();
    for _ in 0..5 {
        app.get("/api/ping", None).await;
    }

    let rejected = app.get("/api/ping", None).await;
    let wait = rejected.header_u64(RETRY_AFTER_HEADER).unwrap();

    app.clock.advance(Duration::from_secs(wait));
    let resp = app.get("/api/ping", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header_u64(REMAINING_HEADER), Some(0));
}

#[tokio::test]
async fn test_retry_after_counts_down() {
    let app = TestApp::new();
    for _ in 0..5 {
        app.get("/api/ping", None).await;
    }

    app.clock.advance(Duration::from_secs(5));
    let resp = app.get("/api/ping", None).await;
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.header_u64(RETRY_AFTER_HEADER), Some(7));
}

#[tokio::test]
async fn test_tiers_get_independent_buckets() {
    let app = TestApp::new();
    let admin = app.token("admin@example.com", &[Role::Admin]);
    let user = app.token("user@example.com", &[Role::User]);

    let a = app.get("/api/ping", Some(&admin)).await;
    let u = app.get("/api/ping", Some(&user)).await;

    assert_eq!(a.header_u64(REMAINING_HEADER), Some(99));
    assert_eq!(u.header_u64(REMAINING_HEADER), Some(29));
    assert_eq!(app.state.admission.tracked_principals(), 2);
}

#[tokio::test]
async fn test_exhausted_user_does_not_block_others() {
    let app = TestApp::new();
    let user = app.token("user@example.com", &[Role::User]);
    let other = app.token("other@example.com", &[Role::User]);

    for _ in 0..30 {
        assert_eq!(app.get("/api/ping", Some(&user)).await.status, StatusCode::OK);
    }
    assert_eq!(
        app.get("/api/ping", Some(&user)).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    let resp = app.get("/api/ping", Some(&other)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header_u64(REMAINING_HEADER), Some(29));
    assert_eq!(app.get("/api/ping", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_token_shares_anonymous_bucket() {
    let app = TestApp::new();

    app.get("/api/ping", None).await;
    let resp = app.get("/api/ping", Some("not-a-jwt")).await;
    assert_eq!(resp.header_u64(REMAINING_HEADER), Some(3));
}

#[tokio::test]
async fn test_me_requires_authentication_but_still_charges() {
    let app = TestApp::new();

    let anonymous = app.get("/api/me", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.header_u64(REMAINING_HEADER), Some(4));

    let token = app.token("admin@example.com", &[Role::Admin]);
    let resp = app.get("/api/me", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["principal"], "admin@example.com");
    assert_eq!(resp.body["data"]["tier"], "PRIVILEGED");
    assert_eq!(resp.body["data"]["roles"][0], "admin");
    assert_eq!(resp.body["data"]["remaining"], 99);
}

#[tokio::test]
async fn test_unrecognized_roles_are_standard_tier() {
    let app = TestApp::new();
    let token = app.token_with_role_names("mod@example.com", &["moderator"]);

    let resp = app.get("/api/me", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["principal"], "mod@example.com");
    assert_eq!(resp.body["data"]["tier"], "STANDARD");
    assert_eq!(resp.header_u64(REMAINING_HEADER), Some(29));

    // The anonymous bucket was never touched.
    let anonymous = app.get("/api/ping", None).await;
    assert_eq!(anonymous.header_u64(REMAINING_HEADER), Some(4));
}

#[tokio::test]
async fn test_lowercase_bearer_scheme_is_accepted() {
    let app = TestApp::new();
    let token = app.token("user@example.com", &[Role::User]);

    let resp = app.get_with_authorization("/api/me", &format!("bearer {token}")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["data"]["tier"], "STANDARD");
}

#[tokio::test]
async fn test_health_is_never_rate_limited() {
    let app = TestApp::new();

    for _ in 0..20 {
        let resp = app.get("/health", None).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.headers.get(REMAINING_HEADER).is_none());
    }
    assert_eq!(app.state.admission.tracked_principals(), 0);
}

#[tokio::test]
async fn test_unknown_route_does_not_spend_tokens() {
    let app = TestApp::new();

    let resp = app.get("/api/does-not-exist", None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(app.state.admission.tracked_principals(), 0);
}

#[tokio::test]
async fn test_custom_protected_prefix() {
    let mut config = AppConfig::default();
    config.rate_limit.protected_prefix = "/v1/".to_string();
    let app = TestApp::with_config(config);

    let resp = app.get("/v1/ping", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header_u64(REMAINING_HEADER), Some(4));
    assert_eq!(app.get("/api/ping", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_disabled_rate_limiting_admits_everything() {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    let app = TestApp::with_config(config);

    for _ in 0..10 {
        let resp = app.get("/api/ping", None).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.headers.get(REMAINING_HEADER).is_none());
    }

    let token = app.token("user@example.com", &[Role::User]);
    let me = app.get("/api/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["data"]["tier"], "STANDARD");
    assert!(me.body["data"].get("remaining").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_from_one_principal() {
    let app = std::sync::Arc::new(TestApp::new());
    let token = app.token("burst@example.com", &[Role::User]);

    let handles: Vec<_> = (0..60)
        .map(|_| {
            let app = std::sync::Arc::clone(&app);
            let token = token.clone();
            tokio::spawn(async move { app.get("/api/ping", Some(&token)).await.status })
        })
        .collect();

    let mut ok = 0;
    let mut limited = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::TOO_MANY_REQUESTS => limited += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(ok, 30);
    assert_eq!(limited, 30);
}
