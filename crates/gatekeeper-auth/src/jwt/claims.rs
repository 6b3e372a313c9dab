//! JWT claims structure used in access tokens.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::identity::Identity;
use crate::role::Role;

/// JWT claims payload embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the principal id (email or username).
    pub sub: String,
    /// Roles held at the time of token issuance. Names this service does
    /// not know are dropped, not rejected.
    #[serde(default, deserialize_with = "known_roles")]
    pub roles: Vec<Role>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// JWT ID.
    pub jti: Uuid,
}

fn known_roles<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Role>, D::Error> {
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(names.iter().filter_map(|name| name.parse().ok()).collect())
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity::new(claims.sub, claims.roles)
    }
}
