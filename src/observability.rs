//! Security Event Logging (AU-2, AU-3)
//!
//! Structured logging for security-relevant events. The application code uses
//! standard `tracing` macros; this module adds a small taxonomy of auditable
//! events so authentication and authorization decisions are logged with
//! consistent fields.
//!
//! # Usage
//!
//! ```ignore
//! use gatehouse::observability::SecurityEvent;
//! use gatehouse::security_event;
//!
//! security_event!(
//!     SecurityEvent::AuthenticationSuccess,
//!     user_id = %user.id,
//!     "User authenticated successfully"
//! );
//! ```

use std::fmt;

use tracing_subscriber::{fmt as sub_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// Event Taxonomy
// ============================================================================

/// Security event categories for audit logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    // Authentication events
    /// Successful credential verification
    AuthenticationSuccess,
    /// Failed login attempt (unknown email and wrong password are not distinguished)
    AuthenticationFailure,

    // Authorization events
    /// Access granted to a protected operation
    AccessGranted,
    /// Access denied to a protected operation
    AccessDenied,

    // Token lifecycle events
    /// Access/refresh token issued
    TokenIssued,
    /// Token failed signature, format, or expiry checks
    TokenRejected,

    // User management events
    /// New user registered
    UserRegistered,

    // System events
    /// Application started
    SystemStartup,
    /// Database connection established
    DatabaseConnected,
}

impl SecurityEvent {
    /// Get the event category for filtering/grouping
    pub fn category(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess | Self::AuthenticationFailure => "authentication",
            Self::AccessGranted | Self::AccessDenied => "authorization",
            Self::TokenIssued | Self::TokenRejected => "token_lifecycle",
            Self::UserRegistered => "user_management",
            Self::SystemStartup | Self::DatabaseConnected => "system",
        }
    }

    /// Get the severity level for the event
    pub fn severity(&self) -> Severity {
        match self {
            Self::AuthenticationFailure | Self::AccessDenied | Self::TokenRejected => {
                Severity::High
            }
            Self::AuthenticationSuccess | Self::UserRegistered => Severity::Medium,
            Self::AccessGranted
            | Self::TokenIssued
            | Self::SystemStartup
            | Self::DatabaseConnected => Severity::Low,
        }
    }

    /// Get the event name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess => "authentication_success",
            Self::AuthenticationFailure => "authentication_failure",
            Self::AccessGranted => "access_granted",
            Self::AccessDenied => "access_denied",
            Self::TokenIssued => "token_issued",
            Self::TokenRejected => "token_rejected",
            Self::UserRegistered => "user_registered",
            Self::SystemStartup => "system_startup",
            Self::DatabaseConnected => "database_connected",
        }
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine operations
    Low,
    /// Important state changes
    Medium,
    /// Security-relevant failures
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Log a security event with structured fields.
///
/// The macro automatically attaches `security_event`, `category`, and
/// `severity` fields and routes the event to the tracing level matching its
/// severity.
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {{
        let event = $event;
        let severity = event.severity();
        let category = event.category();
        let event_name = event.name();

        match severity {
            $crate::observability::Severity::High => {
                ::tracing::warn!(
                    security_event = event_name,
                    category = category,
                    severity = "high",
                    $($field)*
                );
            }
            $crate::observability::Severity::Medium => {
                ::tracing::info!(
                    security_event = event_name,
                    category = category,
                    severity = "medium",
                    $($field)*
                );
            }
            $crate::observability::Severity::Low => {
                ::tracing::debug!(
                    security_event = event_name,
                    category = category,
                    severity = "low",
                    $($field)*
                );
            }
        }
    }};
}

pub use security_event;

// ============================================================================
// Subscriber Initialization
// ============================================================================

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output for development
    Pretty,
    /// JSON lines for log aggregation
    Json,
    /// Single-line output
    Compact,
}

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub log_filter: String,
    /// Output format
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

impl ObservabilityConfig {
    /// Load from environment.
    ///
    /// - `LOG_FILTER`: fallback filter when `RUST_LOG` is unset (default: "info")
    /// - `LOG_FORMAT`: pretty|json|compact (default: compact)
    pub fn from_env() -> Self {
        let log_filter = std::env::var("LOG_FILTER").unwrap_or_else(|_| "info".to_string());
        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("pretty") => LogFormat::Pretty,
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        Self {
            log_filter,
            log_format,
        }
    }
}

/// Observability initialization errors
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("invalid log filter: {0}")]
    Config(String),
    #[error("failed to initialize tracing: {0}")]
    Provider(String),
}

/// Initialize the tracing subscriber.
///
/// Must be called once at application startup, before any logging occurs.
/// `RUST_LOG` takes precedence over the configured filter.
pub fn init(config: ObservabilityConfig) -> Result<(), ObservabilityError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| ObservabilityError::Config(e.to_string()))?;

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Pretty => subscriber
            .with(sub_fmt::layer().pretty().with_target(true))
            .try_init()
            .map_err(|e| ObservabilityError::Provider(e.to_string()))?,
        LogFormat::Json => subscriber
            .with(sub_fmt::layer().json().with_target(true))
            .try_init()
            .map_err(|e| ObservabilityError::Provider(e.to_string()))?,
        LogFormat::Compact => subscriber
            .with(sub_fmt::layer().compact().with_target(true))
            .try_init()
            .map_err(|e| ObservabilityError::Provider(e.to_string()))?,
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_categories() {
        assert_eq!(SecurityEvent::AuthenticationSuccess.category(), "authentication");
        assert_eq!(SecurityEvent::AccessDenied.category(), "authorization");
        assert_eq!(SecurityEvent::TokenRejected.category(), "token_lifecycle");
        assert_eq!(SecurityEvent::UserRegistered.category(), "user_management");
        assert_eq!(SecurityEvent::SystemStartup.category(), "system");
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(SecurityEvent::AuthenticationFailure.severity(), Severity::High);
        assert_eq!(SecurityEvent::UserRegistered.severity(), Severity::Medium);
        assert_eq!(SecurityEvent::TokenIssued.severity(), Severity::Low);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn test_config_from_env_defaults() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.log_format, LogFormat::Compact);
    }
}
