//! Axum middleware stack.

pub mod logging;
pub mod rate_limit;
