//! Resolved caller identity.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// An authenticated caller as seen by the admission layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique principal identifier (account email or username). Case-sensitive.
    pub principal: String,
    /// Roles held at the time the token was issued.
    pub roles: Vec<Role>,
}

impl Identity {
    /// Creates an identity from a principal id and its roles.
    pub fn new(principal: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            principal: principal.into(),
            roles,
        }
    }

    /// Whether any held role is the privileged marker.
    pub fn is_privileged(&self) -> bool {
        self.roles.iter().any(Role::is_privileged)
    }
}

/// Resolves the caller's identity from the raw `Authorization` header value.
///
/// Returns `None` for anonymous callers. Implementations must not fail the
/// request: a credential that cannot be verified resolves to `None`.
pub trait IdentityResolver: std::fmt::Debug + Send + Sync + 'static {
    /// Resolve the identity behind an optional `Authorization` header value.
    fn resolve(&self, authorization: Option<&str>) -> Option<Identity>;
}
