//! # gatekeeper-api
//!
//! HTTP API layer for Gatekeeper built on Axum.
//!
//! Provides the admission-control middleware that guards the protected
//! route prefix, request logging, the `ApiError` HTTP mapping, the
//! identity extractor, and a small set of handlers.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
