//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every section has defaults, so an absent file yields a runnable
//! configuration.

pub mod app;
pub mod auth;
pub mod logging;
pub mod rate_limit;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::auth::AuthConfig;
pub use self::logging::LoggingConfig;
pub use self::rate_limit::{EvictionConfig, RateLimitConfig, TierLimitConfig};

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "GATEKEEPER";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Bearer token settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Admission-control settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `GATEKEEPER__`, then validates
    /// the result.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        Self::finish(config)
    }

    /// Parse and validate configuration from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        Self::finish(config)
    }

    /// Validate every section. Any error here is fatal at startup.
    pub fn validate(&self) -> Result<(), AppError> {
        self.rate_limit.validate()?;

        if self.auth.jwt_secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }

        Ok(())
    }

    fn finish(config: config::Config) -> Result<Self, AppError> {
        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app_config.validate()?;

        tracing::debug!(
            window_minutes = app_config.rate_limit.window_minutes,
            protected_prefix = %app_config.rate_limit.protected_prefix,
            "Configuration loaded"
        );

        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rate_limit.anonymous.capacity, 5);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_tier_overrides() {
        let config = AppConfig::from_toml_str(
            r#"
            [rate_limit]
            window_minutes = 2

            [rate_limit.standard]
            capacity = 10
            refill_amount = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.rate_limit.window_minutes, 2);
        assert_eq!(config.rate_limit.standard.capacity, 10);
        assert_eq!(config.rate_limit.standard.refill_amount, 4);
        assert_eq!(config.rate_limit.privileged.capacity, 100);
    }

    #[test]
    fn test_zero_capacity_fails_load() {
        let err = AppConfig::from_toml_str(
            r#"
            [rate_limit.anonymous]
            capacity = 0
            refill_amount = 5
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_negative_capacity_fails_load() {
        let err = AppConfig::from_toml_str(
            r#"
            [rate_limit.anonymous]
            capacity = -3
            refill_amount = 5
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
