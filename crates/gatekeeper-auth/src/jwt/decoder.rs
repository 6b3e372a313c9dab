//! JWT token validation and bearer identity resolution.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use gatekeeper_core::config::AuthConfig;
use gatekeeper_core::error::AppError;

use super::claims::Claims;
use crate::identity::{Identity, IdentityResolver};

/// Authentication scheme of the `Authorization` header, matched case-insensitively.
const BEARER_SCHEME: &str = "Bearer";

/// Validates JWT tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // seconds of clock skew

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        if token_data.claims.sub.is_empty() {
            return Err(AppError::authentication("Token has an empty subject"));
        }

        Ok(token_data.claims)
    }
}

impl IdentityResolver for JwtDecoder {
    fn resolve(&self, authorization: Option<&str>) -> Option<Identity> {
        let (scheme, token) = authorization?.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
            return None;
        }
        let token = token.trim_start();

        match self.decode_access_token(token) {
            Ok(claims) => Some(Identity::from(claims)),
            Err(e) => {
                debug!(error = %e, "Unverifiable bearer token, treating caller as anonymous");
                None
            }
        }
    }
}
