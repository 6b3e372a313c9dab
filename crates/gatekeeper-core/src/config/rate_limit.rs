//! Admission-control (rate limiting) configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Per-principal rate limiting configuration.
///
/// Loaded once at startup and never hot-reloaded. Every tier shares the same
/// refill window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether the admission middleware is installed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path prefix of the rate-limited API surface.
    #[serde(default = "default_protected_prefix")]
    pub protected_prefix: String,
    /// Refill window shared by all tiers, in minutes.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,
    /// Limits for unauthenticated callers (all of them share one bucket).
    #[serde(default = "default_anonymous")]
    pub anonymous: TierLimitConfig,
    /// Limits for authenticated callers without the privileged role.
    #[serde(default = "default_standard")]
    pub standard: TierLimitConfig,
    /// Limits for authenticated callers holding the privileged role.
    #[serde(default = "default_privileged")]
    pub privileged: TierLimitConfig,
    /// Optional idle-bucket eviction. Disabled by default.
    #[serde(default)]
    pub eviction: EvictionConfig,
}

/// Bucket sizing for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimitConfig {
    /// Maximum number of tokens the bucket holds.
    pub capacity: u64,
    /// Tokens added back per window.
    pub refill_amount: u64,
}

/// Idle-bucket eviction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvictionConfig {
    /// Whether the background sweeper runs.
    #[serde(default)]
    pub enabled: bool,
    /// Buckets untouched for longer than this are dropped.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Interval between sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            protected_prefix: default_protected_prefix(),
            window_minutes: default_window_minutes(),
            anonymous: default_anonymous(),
            standard: default_standard(),
            privileged: default_privileged(),
            eviction: EvictionConfig::default(),
        }
    }
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            idle_timeout_seconds: default_idle_timeout(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl RateLimitConfig {
    /// Rejects non-positive limits so a misconfigured process never starts.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.window_minutes == 0 {
            return Err(AppError::configuration(
                "rate_limit.window_minutes must be greater than zero",
            ));
        }

        for (tier, limits) in [
            ("anonymous", &self.anonymous),
            ("standard", &self.standard),
            ("privileged", &self.privileged),
        ] {
            if limits.capacity == 0 {
                return Err(AppError::configuration(format!(
                    "rate_limit.{tier}.capacity must be greater than zero"
                )));
            }
            if limits.refill_amount == 0 {
                return Err(AppError::configuration(format!(
                    "rate_limit.{tier}.refill_amount must be greater than zero"
                )));
            }
        }

        if !self.protected_prefix.starts_with('/') {
            return Err(AppError::configuration(format!(
                "rate_limit.protected_prefix must start with '/', got '{}'",
                self.protected_prefix
            )));
        }

        if self.eviction.enabled
            && (self.eviction.idle_timeout_seconds == 0 || self.eviction.sweep_interval_seconds == 0)
        {
            return Err(AppError::configuration(
                "rate_limit.eviction timings must be greater than zero when eviction is enabled",
            ));
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_protected_prefix() -> String {
    "/api".to_string()
}

fn default_window_minutes() -> u64 {
    1
}

fn default_anonymous() -> TierLimitConfig {
    TierLimitConfig {
        capacity: 5,
        refill_amount: 5,
    }
}

fn default_standard() -> TierLimitConfig {
    TierLimitConfig {
        capacity: 30,
        refill_amount: 20,
    }
}

fn default_privileged() -> TierLimitConfig {
    TierLimitConfig {
        capacity: 100,
        refill_amount: 50,
    }
}

fn default_idle_timeout() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    300
}
