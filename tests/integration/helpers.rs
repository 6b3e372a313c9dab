//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use gatekeeper_api::AppState;
use gatekeeper_auth::{JwtDecoder, JwtEncoder, Role};
use gatekeeper_core::config::AppConfig;
use gatekeeper_limiter::{AdmissionController, BucketStore, MockClock, TierPolicy};

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for inspecting the bucket store
    pub state: AppState,
    /// Clock driving every bucket
    pub clock: MockClock,
    /// Mints bearer tokens accepted by the app
    pub encoder: JwtEncoder,
}

impl TestApp {
    /// Create a test application with default limits and a frozen clock
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application from an explicit configuration
    pub fn with_config(config: AppConfig) -> Self {
        config.validate().expect("Invalid test config");

        let clock = MockClock::new();
        let store = Arc::new(BucketStore::with_clock(Arc::new(clock.clone())));
        let policy = TierPolicy::from_config(&config.rate_limit).expect("Invalid tier policy");
        let encoder = JwtEncoder::new(&config.auth);
        let decoder = Arc::new(JwtDecoder::new(&config.auth));

        let state = AppState::new(config, decoder, AdmissionController::new(policy, store));
        let router = gatekeeper_api::build_router(state.clone());

        Self {
            router,
            state,
            clock,
            encoder,
        }
    }

    /// Mint an access token for `principal` holding `roles`
    pub fn token(&self, principal: &str, roles: &[Role]) -> String {
        self.encoder
            .generate_access_token(principal, roles)
            .expect("Failed to mint token")
            .0
    }

    /// Mint a token whose `roles` claim holds arbitrary role names
    pub fn token_with_role_names(&self, principal: &str, roles: &[&str]) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": principal,
            "roles": roles,
            "iat": now,
            "exp": now + 900,
            "jti": "6f1c1a52-3c1e-4f3e-9d55-0f6a2f1b7c10",
        });
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(self.state.config.auth.jwt_secret.as_bytes()),
        )
        .expect("Failed to mint token")
    }

    /// Make a GET request to the test app
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let authorization = token.map(|token| format!("Bearer {}", token));
        self.send(path, authorization.as_deref()).await
    }

    /// Make a GET request with a verbatim `Authorization` header
    pub async fn get_with_authorization(&self, path: &str, authorization: &str) -> TestResponse {
        self.send(path, Some(authorization)).await
    }

    async fn send(&self, path: &str, authorization: Option<&str>) -> TestResponse {
        let mut req = Request::builder().method("GET").uri(path);

        if let Some(authorization) = authorization {
            req = req.header("Authorization", authorization);
        }

        let req = req.body(Body::empty()).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as JSON
    pub body: Value,
}

impl TestResponse {
    /// Parse a numeric header
    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}
