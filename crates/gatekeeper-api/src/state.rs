//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use gatekeeper_auth::{IdentityResolver, JwtDecoder};
use gatekeeper_core::config::AppConfig;
use gatekeeper_core::result::AppResult;
use gatekeeper_limiter::{AdmissionController, BucketStore, TierPolicy};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Resolves the caller behind the `Authorization` header
    pub identity: Arc<dyn IdentityResolver>,
    /// Per-principal admission control
    pub admission: Arc<AdmissionController>,
}

impl AppState {
    /// Assembles state from explicit parts.
    pub fn new(
        config: AppConfig,
        identity: Arc<dyn IdentityResolver>,
        admission: AdmissionController,
    ) -> Self {
        Self {
            config: Arc::new(config),
            identity,
            admission: Arc::new(admission),
        }
    }

    /// Builds production state: JWT identity resolution and a fresh bucket
    /// store on the system clock.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let policy = TierPolicy::from_config(&config.rate_limit)?;
        let store = Arc::new(BucketStore::new());
        let decoder = Arc::new(JwtDecoder::new(&config.auth));

        Ok(Self::new(
            config,
            decoder,
            AdmissionController::new(policy, store),
        ))
    }

    /// The bucket store owned by this process.
    pub fn bucket_store(&self) -> Arc<BucketStore> {
        Arc::clone(self.admission.store())
    }
}
