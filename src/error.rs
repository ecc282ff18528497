//! Error Taxonomy and Secure Responses (SI-11)
//!
//! Central failure type for the authentication core. Every expected failure
//! path is typed and mapped to an HTTP status and a machine-stable category
//! string; internal detail is logged but never exposed in a response body.
//!
//! Two failure modes are deliberately indistinguishable to callers:
//! unknown email and wrong password both surface as `InvalidCredentials`, so
//! the login endpoint cannot be used to enumerate accounts.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::password::HashError;
use crate::store::StoreError;
use crate::token::TokenError;
use crate::validation::ValidationError;

/// Failures surfaced by the authentication and authorization core.
#[derive(Debug)]
pub enum AuthError {
    /// Malformed or missing request fields (400)
    Validation(ValidationError),
    /// Login failed; cause (unknown email vs wrong password) is not revealed (401)
    InvalidCredentials,
    /// No proof of identity: missing or malformed bearer credentials (401)
    Unauthorized(&'static str),
    /// Token failed signature, format, or algorithm checks (401)
    TokenInvalid,
    /// Token is past its expiry (401)
    TokenExpired,
    /// Identity proven but role is insufficient (403)
    Forbidden,
    /// Registration conflict on email (409)
    DuplicateEmail,
    /// Refresh target no longer exists (409)
    UserNotFound,
    /// Underlying persistence failure (500); detail is logged, not exposed
    Store(String),
    /// Hashing or signing backend failure (500); detail is logged, not exposed
    Internal(String),
}

impl AuthError {
    /// Machine-stable category string used in response bodies.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthorized(_) => "unauthorized",
            Self::TokenInvalid => "token_invalid",
            Self::TokenExpired => "token_expired",
            Self::Forbidden => "forbidden",
            Self::DuplicateEmail => "duplicate_email",
            Self::UserNotFound => "user_not_found",
            Self::Store(_) => "store_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status code for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials
            | Self::Unauthorized(_)
            | Self::TokenInvalid
            | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::DuplicateEmail | Self::UserNotFound => StatusCode::CONFLICT,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message exposed to the client. Internal failures get a generic
    /// message; their detail only reaches the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::Unauthorized(reason) => (*reason).to_string(),
            Self::TokenInvalid => "Invalid token".to_string(),
            Self::TokenExpired => "Token expired".to_string(),
            Self::Forbidden => "Access denied".to_string(),
            Self::DuplicateEmail => "Email is already registered".to_string(),
            Self::UserNotFound => "User not found".to_string(),
            Self::Store(_) | Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    fn log(&self) {
        match self {
            Self::Store(detail) | Self::Internal(detail) => {
                tracing::error!(error = self.category(), detail = %detail, "Internal error");
            }
            Self::InvalidCredentials
            | Self::Unauthorized(_)
            | Self::TokenInvalid
            | Self::TokenExpired
            | Self::Forbidden => {
                tracing::warn!(error = self.category(), "Auth error");
            }
            _ => {
                tracing::debug!(error = self.category(), "Client error");
            }
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category(), self.public_message())
    }
}

impl std::error::Error for AuthError {}

// ============================================================================
// Conversions
// ============================================================================

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Invalid => Self::TokenInvalid,
            TokenError::Signing(detail) => Self::Internal(detail),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::Backend(detail) => Self::Store(detail),
        }
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        Self::Internal(err.to_string())
    }
}

// ============================================================================
// Response Mapping
// ============================================================================

/// JSON error response format
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    /// Machine-stable error category
    pub error: String,
    /// Human-readable message, safe to expose
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();

        let response = ErrorResponse {
            error: self.category().to_string(),
            message: self.public_message(),
        };

        (self.status_code(), Json(response)).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================
