//! Route definitions for the Gatekeeper HTTP API.
//!
//! Routes under the configured protected prefix pass through admission
//! control; everything else (health) is never rate limited.

use axum::{Router, middleware as axum_middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let rate_limit = &state.config.rate_limit;

    let mut api = api_routes();
    if rate_limit.enabled {
        // `route_layer` so unmatched paths 404 without spending a token.
        api = api.route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::admission_control,
        ));
    } else {
        tracing::warn!("Rate limiting disabled by configuration");
    }

    let prefix = rate_limit.protected_prefix.trim_end_matches('/');
    let router = Router::new().merge(health_routes());
    let router = if prefix.is_empty() {
        router.merge(api)
    } else {
        router.nest(prefix, api)
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Rate-limited API surface.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(handlers::caller::ping))
        .route("/me", get(handlers::caller::me))
}

/// Unlimited operational endpoints.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
