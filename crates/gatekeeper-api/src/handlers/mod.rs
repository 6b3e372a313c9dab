//! HTTP request handlers.

pub mod caller;
pub mod health;
