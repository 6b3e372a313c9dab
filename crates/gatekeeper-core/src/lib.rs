//! # gatekeeper-core
//!
//! Core crate for Gatekeeper. Contains the configuration schemas, startup
//! validation, and the unified error system shared by every other crate.
//!
//! This crate has **no** internal dependencies on other Gatekeeper crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
