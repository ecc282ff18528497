//! Signing Secret Validation (IA-5, SC-12)
//!
//! Environment-aware validation of the token signing secret. The secret is
//! loaded once at startup and shared read-only for the process lifetime, so a
//! weak value cannot be corrected without a restart - it must be rejected
//! before the service begins accepting traffic.
//!
//! # Example
//!
//! ```
//! use gatehouse::SecretPolicy;
//!
//! let policy = SecretPolicy::for_environment("production");
//! assert!(policy.validate("short").is_err());
//! ```

use std::fmt;

/// Error type for signing secret validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// Secret is too short for the required environment
    TooShort {
        actual: usize,
        minimum: usize,
        context: String,
    },
    /// Secret contains a weak/common pattern
    WeakPattern { pattern: String },
}

impl fmt::Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort {
                actual,
                minimum,
                context,
            } => {
                write!(
                    f,
                    "Signing secret length ({} chars) is below minimum ({} chars) for {}",
                    actual, minimum, context
                )
            }
            Self::WeakPattern { pattern } => {
                write!(f, "Signing secret contains weak pattern: '{}'", pattern)
            }
        }
    }
}

impl std::error::Error for SecretError {}

/// Patterns that indicate a placeholder rather than generated key material.
const WEAK_PATTERNS: &[&str] = &[
    "secret",
    "password",
    "changeme",
    "default",
    "example",
    "12345",
    "qwerty",
];

/// Policy for signing secret validation.
///
/// Length requirements scale with the deployment environment; weak-pattern
/// screening applies everywhere.
#[derive(Debug, Clone)]
pub struct SecretPolicy {
    /// Minimum secret length in characters
    pub min_length: usize,
    /// Context string for error messages
    pub context: String,
}

impl Default for SecretPolicy {
    fn default() -> Self {
        Self::for_environment("development")
    }
}

impl SecretPolicy {
    /// Create a policy for a specific environment.
    ///
    /// # Environments
    ///
    /// - `production`: 64 char minimum
    /// - `staging`: 48 char minimum
    /// - `testing` / `development` (default): 32 char minimum
    pub fn for_environment(environment: &str) -> Self {
        match environment.to_lowercase().as_str() {
            "production" | "prod" => Self {
                min_length: 64,
                context: "production environment".to_string(),
            },
            "staging" | "stage" => Self {
                min_length: 48,
                context: "staging environment".to_string(),
            },
            "testing" | "test" => Self {
                min_length: 32,
                context: "testing environment".to_string(),
            },
            _ => Self {
                min_length: 32,
                context: "development environment".to_string(),
            },
        }
    }

    /// Validate a secret against this policy.
    pub fn validate(&self, secret: &str) -> Result<(), SecretError> {
        if secret.len() < self.min_length {
            return Err(SecretError::TooShort {
                actual: secret.len(),
                minimum: self.min_length,
                context: self.context.clone(),
            });
        }

        let lowered = secret.to_lowercase();
        for pattern in WEAK_PATTERNS {
            if lowered.contains(pattern) {
                return Err(SecretError::WeakPattern {
                    pattern: pattern.to_string(),
                });
            }
        }

        Ok(())
    }
}
