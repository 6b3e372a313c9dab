//! Response DTOs.

use serde::{Deserialize, Serialize};

use gatekeeper_auth::Role;
use gatekeeper_limiter::Tier;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Application version.
    pub version: String,
    /// Principals with a live rate limit bucket.
    pub tracked_principals: usize,
}

/// Liveness probe for the protected surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    /// Always `true`.
    pub pong: bool,
}

/// The authenticated caller as seen by admission control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerResponse {
    /// Principal id.
    pub principal: String,
    /// Roles carried by the token.
    pub roles: Vec<Role>,
    /// Tier the caller is classified into.
    pub tier: Tier,
    /// Tokens left after this request, absent when admission control is off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}
