//! `AuthUser` extractor: requires an authenticated caller.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use gatekeeper_auth::Identity;
use gatekeeper_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity resolved by the admission middleware, stored in request extensions
/// so the token is verified once per request.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Option<Identity>);

/// Extracted authenticated caller available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl std::ops::Deref for AuthUser {
    type Target = Identity;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Admission middleware already resolved the caller.
        let identity = match parts.extensions.get::<CallerIdentity>() {
            Some(CallerIdentity(identity)) => identity.clone(),
            None => {
                let authorization = parts
                    .headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok());
                state.identity.resolve(authorization)
            }
        };

        identity
            .map(AuthUser)
            .ok_or_else(|| AppError::authentication("Authentication required").into())
    }
}
