//! Per-request admission decision.
//!
//! `RECEIVED → CLASSIFIED → CONSUMED(granted | rejected) → FORWARDED | REJECTED`.
//! A rejection is final for that request: nothing is queued or retried here.

use std::sync::Arc;

use tracing::{debug, warn};

use gatekeeper_auth::Identity;
use gatekeeper_core::error::AppError;

use crate::store::{BucketStore, PrincipalKey};
use crate::tier::{Tier, TierPolicy};

/// Tokens charged per request.
const REQUEST_COST: u64 = 1;

/// A granted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Key the request was charged to.
    pub principal: PrincipalKey,
    /// Tier the caller was classified into for this request.
    pub tier: Tier,
    /// Tokens left after this request.
    pub remaining: u64,
}

/// Charges each request against its principal's bucket.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    policy: TierPolicy,
    store: Arc<BucketStore>,
}

impl AdmissionController {
    /// Creates a controller over an injected store.
    pub fn new(policy: TierPolicy, store: Arc<BucketStore>) -> Self {
        Self { policy, store }
    }

    /// The bucket store in use.
    pub fn store(&self) -> &Arc<BucketStore> {
        &self.store
    }

    /// Number of principals with a live bucket.
    pub fn tracked_principals(&self) -> usize {
        self.store.len()
    }

    /// Classifies the caller and consumes one token from its bucket.
    ///
    /// Returns [`AppError::rate_limited`] carrying the wait until the next
    /// token when the bucket is empty.
    pub fn admit(&self, identity: Option<&Identity>) -> Result<Admission, AppError> {
        let tier = Tier::classify(identity);
        let principal = match identity {
            Some(identity) => PrincipalKey::principal(identity.principal.as_str()),
            None => PrincipalKey::Anonymous,
        };

        let config = self.policy.resolve_config(tier);
        let bucket = self.store.get_or_create(&principal, &config);
        let probe = bucket.try_consume(REQUEST_COST);

        if probe.granted {
            debug!(
                principal = %principal,
                tier = %tier,
                remaining = probe.remaining,
                "Request admitted"
            );
            return Ok(Admission {
                principal,
                tier,
                remaining: probe.remaining,
            });
        }

        let retry_after = probe.retry_after();
        warn!(
            principal = %principal,
            tier = %tier,
            retry_after_seconds = retry_after.as_secs(),
            "Rate limit exceeded"
        );
        Err(AppError::rate_limited(retry_after))
    }
}
