//! Caller tiers and their bucket sizing.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use gatekeeper_auth::Identity;
use gatekeeper_core::config::{RateLimitConfig, TierLimitConfig};
use gatekeeper_core::error::AppError;

/// Coarse caller classification sharing one bucket configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    /// No authenticated identity.
    Anonymous,
    /// Authenticated without the privileged role.
    Standard,
    /// Authenticated and holding the privileged role.
    Privileged,
}

impl Tier {
    /// Classify a caller. Re-derived on every request since roles can change
    /// between requests.
    pub fn classify(identity: Option<&Identity>) -> Self {
        match identity {
            None => Self::Anonymous,
            Some(identity) if identity.is_privileged() => Self::Privileged,
            Some(_) => Self::Standard,
        }
    }

    /// Return the tier as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "ANONYMOUS",
            Self::Standard => "STANDARD",
            Self::Privileged => "PRIVILEGED",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable sizing of one token bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketConfig {
    capacity: u64,
    refill_amount: u64,
    window: Duration,
}

impl BucketConfig {
    /// Builds a config, rejecting zero capacity, refill amount, or window.
    pub fn new(capacity: u64, refill_amount: u64, window: Duration) -> Result<Self, AppError> {
        if capacity == 0 {
            return Err(AppError::configuration("Bucket capacity must be positive"));
        }
        if refill_amount == 0 {
            return Err(AppError::configuration("Bucket refill amount must be positive"));
        }
        if window.is_zero() {
            return Err(AppError::configuration("Bucket refill window must be positive"));
        }

        Ok(Self {
            capacity,
            refill_amount,
            window,
        })
    }

    /// Maximum number of tokens.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Tokens restored per window.
    pub fn refill_amount(&self) -> u64 {
        self.refill_amount
    }

    /// Refill window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Time it takes to restore one token.
    pub fn token_period(&self) -> Duration {
        let nanos = self.window.as_nanos() / u128::from(self.refill_amount);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Maps each [`Tier`] to its [`BucketConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPolicy {
    anonymous: BucketConfig,
    standard: BucketConfig,
    privileged: BucketConfig,
}

impl TierPolicy {
    /// Creates a policy from explicit per-tier configs.
    pub fn new(anonymous: BucketConfig, standard: BucketConfig, privileged: BucketConfig) -> Self {
        Self {
            anonymous,
            standard,
            privileged,
        }
    }

    /// Builds the policy from the loaded rate limit configuration.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, AppError> {
        let minutes = config.window_minutes;
        let window = Duration::from_secs(minutes.checked_mul(60).ok_or_else(|| {
            AppError::configuration(format!("rate_limit.window_minutes is too large: {minutes}"))
        })?);

        let build = |limits: &TierLimitConfig| {
            BucketConfig::new(limits.capacity, limits.refill_amount, window)
        };

        Ok(Self::new(
            build(&config.anonymous)?,
            build(&config.standard)?,
            build(&config.privileged)?,
        ))
    }

    /// Bucket configuration for `tier`.
    pub fn resolve_config(&self, tier: Tier) -> BucketConfig {
        match tier {
            Tier::Anonymous => self.anonymous,
            Tier::Standard => self.standard,
            Tier::Privileged => self.privileged,
        }
    }
}
