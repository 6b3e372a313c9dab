//! Handlers on the protected API surface.

use axum::{Extension, Json};

use gatekeeper_limiter::{Admission, Tier};

use crate::dto::response::{ApiResponse, CallerResponse, PingResponse};
use crate::extractors::AuthUser;

/// GET {prefix}/ping
pub async fn ping() -> Json<ApiResponse<PingResponse>> {
    Json(ApiResponse::ok(PingResponse { pong: true }))
}

/// GET {prefix}/me
///
/// Reports the tier this request was charged as. With admission control
/// disabled there is no charge, so the tier is classified directly.
pub async fn me(
    auth: AuthUser,
    admission: Option<Extension<Admission>>,
) -> Json<ApiResponse<CallerResponse>> {
    let (tier, remaining) = match admission {
        Some(Extension(admission)) => (admission.tier, Some(admission.remaining)),
        None => (Tier::classify(Some(&auth.0)), None),
    };
    let AuthUser(identity) = auth;

    Json(ApiResponse::ok(CallerResponse {
        principal: identity.principal,
        roles: identity.roles,
        tier,
        remaining,
    }))
}
