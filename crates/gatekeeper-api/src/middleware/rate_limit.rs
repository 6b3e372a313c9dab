//! Per-principal admission-control middleware.
//!
//! Runs once before every protected handler. A granted request continues
//! with `X-Rate-Limit-Remaining` on its response; a rejected one never
//! reaches the handler and is rendered by the `ApiError` response mapping
//! as a 429 carrying `X-Rate-Limit-Retry-After-Seconds`.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::extractors::CallerIdentity;
use crate::state::AppState;

/// Tokens left after an admitted request.
pub const REMAINING_HEADER: &str = "x-rate-limit-remaining";
/// Whole seconds a rejected caller should wait before retrying.
pub const RETRY_AFTER_HEADER: &str = "x-rate-limit-retry-after-seconds";

/// Charges one token to the caller's bucket or rejects the request.
pub async fn admission_control(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = state.identity.resolve(authorization);
    let admission = state.admission.admit(identity.as_ref())?;
    let remaining = admission.remaining;

    request.extensions_mut().insert(CallerIdentity(identity));
    request.extensions_mut().insert(admission);

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(REMAINING_HEADER, HeaderValue::from(remaining));

    Ok(response)
}
