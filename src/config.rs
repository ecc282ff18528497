//! Authentication Configuration
//!
//! Loads the signing secret and token lifetimes from the environment once at
//! startup. The values are treated as immutable for the process lifetime -
//! the secret in particular is constructed here, validated, and then only
//! ever shared read-only with the token service.
//!
//! # Environment Variables
//!
//! - `JWT_SECRET_KEY`: token signing secret (required, strength-checked)
//! - `ACCESS_TOKEN_TTL`: access token lifetime (default: "15m")
//! - `REFRESH_TOKEN_TTL`: refresh token lifetime (default: "7d")
//! - `APP_ENV`: deployment environment, drives secret policy (default: "development")

use std::time::Duration;

use crate::parse::parse_duration;
use crate::secret::{SecretError, SecretPolicy};

/// Default access token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration errors are fatal: the process must refuse to start rather
/// than serve tokens signed with a missing or weak secret.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY environment variable is not set")]
    MissingSecret,
    #[error("signing secret rejected: {0}")]
    WeakSecret(#[from] SecretError),
    #[error("invalid duration '{value}' for {key}")]
    InvalidDuration { key: &'static str, value: String },
}

/// Authentication core configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Deployment environment name ("development", "staging", "production")
    pub environment: String,

    /// Symmetric token signing secret, shared by issuance and verification
    pub jwt_secret: String,

    /// Lifetime of issued access tokens
    pub access_ttl: Duration,

    /// Lifetime of issued refresh tokens
    pub refresh_ttl: Duration,
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// The signing secret is required and validated against the
    /// environment-appropriate [`SecretPolicy`]. TTL variables fall back to
    /// their defaults when unset, but a value that is set and unparseable is
    /// an error rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let jwt_secret =
            std::env::var("JWT_SECRET_KEY").map_err(|_| ConfigError::MissingSecret)?;
        SecretPolicy::for_environment(&environment).validate(&jwt_secret)?;

        let access_ttl = ttl_from_env("ACCESS_TOKEN_TTL", DEFAULT_ACCESS_TTL)?;
        let refresh_ttl = ttl_from_env("REFRESH_TOKEN_TTL", DEFAULT_REFRESH_TTL)?;

        Ok(Self {
            environment,
            jwt_secret,
            access_ttl,
            refresh_ttl,
        })
    }
}

fn ttl_from_env(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_duration(&value).ok_or(ConfigError::InvalidDuration { key, value }),
        Err(_) => Ok(default),
    }
}
