//! # gatekeeper-auth
//!
//! Identity collaborator for the admission layer. Turns an optional
//! `Authorization: Bearer` header into an optional [`Identity`] carrying the
//! caller's principal id and role set.
//!
//! ## Modules
//!
//! - `role`: the finite role enumeration
//! - `identity`: resolved caller identity and the [`IdentityResolver`] seam
//! - `jwt`: HS256 token creation and validation

pub mod identity;
pub mod jwt;
pub mod role;

pub use identity::{Identity, IdentityResolver};
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use role::Role;
