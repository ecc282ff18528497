//! Input Validation (SI-10)
//!
//! Declarative validation for request payloads, with an Axum extractor that
//! enforces it before a handler runs.
//!
//! # Usage
//!
//! ```ignore
//! use gatehouse::{Validate, ValidationError, ValidatedJson};
//! use gatehouse::validation::{validate_email, validate_required};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct CreateUser {
//!     email: String,
//!     password: String,
//! }
//!
//! impl Validate for CreateUser {
//!     fn validate(&self) -> Result<(), ValidationError> {
//!         validate_email(&self.email)?;
//!         validate_required(&self.password, "password")?;
//!         Ok(())
//!     }
//! }
//!
//! async fn create_user(ValidatedJson(payload): ValidatedJson<CreateUser>) {
//!     // payload is guaranteed to be valid
//! }
//! ```

use std::fmt;

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;

/// Validation error with field context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Field that failed validation (if applicable)
    pub field: Option<String>,
    /// Error code for programmatic handling
    pub code: ValidationErrorCode,
    /// Human-readable message
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            field: None,
            code,
            message: message.into(),
        }
    }

    /// Create a validation error for a specific field
    pub fn for_field(
        field: impl Into<String>,
        code: ValidationErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: Some(field.into()),
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validation error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// Value is required but missing/empty
    Required,
    /// Value is too short
    TooShort,
    /// Value is too long
    TooLong,
    /// Email format is invalid
    InvalidEmail,
    /// Value doesn't match expected pattern
    InvalidFormat,
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::TooShort => write!(f, "too_short"),
            Self::TooLong => write!(f, "too_long"),
            Self::InvalidEmail => write!(f, "invalid_email"),
            Self::InvalidFormat => write!(f, "invalid_format"),
        }
    }
}

/// Trait for validatable request types
pub trait Validate {
    /// Validate the instance, returning an error if invalid
    fn validate(&self) -> Result<(), ValidationError>;

    /// Check if the instance is valid (convenience method)
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

// ============================================================================
// Field Validators
// ============================================================================

/// Validate that a string is not empty (SI-10)
pub fn validate_required(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::for_field(
            field,
            ValidationErrorCode::Required,
            "Field is required",
        ));
    }
    Ok(())
}

/// Validate string length bounds (SI-10)
pub fn validate_length(
    value: &str,
    min: usize,
    max: usize,
    field: &str,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::for_field(
            field,
            ValidationErrorCode::TooShort,
            format!("Must be at least {} characters", min),
        ));
    }
    if len > max {
        return Err(ValidationError::for_field(
            field,
            ValidationErrorCode::TooLong,
            format!("Must be at most {} characters", max),
        ));
    }
    Ok(())
}

/// Validate email format (SI-10)
///
/// A pragmatic check that accepts most valid addresses while rejecting
/// obviously invalid ones. Does not validate deliverability.
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    let parts: Vec<&str> = value.split('@').collect();
    if parts.len() != 2 {
        return Err(ValidationError::for_field(
            "email",
            ValidationErrorCode::InvalidEmail,
            "Invalid email format",
        ));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || local.len() > 64 {
        return Err(ValidationError::for_field(
            "email",
            ValidationErrorCode::InvalidEmail,
            "Invalid email local part",
        ));
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Err(ValidationError::for_field(
            "email",
            ValidationErrorCode::InvalidEmail,
            "Invalid email local part",
        ));
    }

    if domain.is_empty() || domain.len() > 255 || !domain.contains('.') {
        return Err(ValidationError::for_field(
            "email",
            ValidationErrorCode::InvalidEmail,
            "Invalid email domain",
        ));
    }
    if !domain.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '-') {
        return Err(ValidationError::for_field(
            "email",
            ValidationErrorCode::InvalidEmail,
            "Invalid email domain characters",
        ));
    }

    Ok(())
}

// ============================================================================
// Axum Extractor
// ============================================================================

/// Validation rejection response
///
/// Maps to 400 Bad Request: a malformed or invalid field is a
/// user-correctable client error.
#[derive(Debug)]
pub struct ValidationRejection {
    /// The validation error that caused the rejection
    pub error: ValidationError,
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "validation_error",
            "code": self.error.code.to_string(),
            "field": self.error.field,
            "message": self.error.message,
        });

        (
            StatusCode::BAD_REQUEST,
            [("content-type", "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

impl From<ValidationError> for ValidationRejection {
    fn from(error: ValidationError) -> Self {
        Self { error }
    }
}

/// Validated JSON extractor (SI-10)
///
/// Deserializes and validates JSON payloads before the handler runs. The
/// inner type must implement both `DeserializeOwned` and `Validate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            tracing::warn!(error = %e, "JSON parsing failed");
            (
                StatusCode::BAD_REQUEST,
                [("content-type", "application/json")],
                r#"{"error":"invalid_json","message":"Failed to parse JSON body"}"#,
            )
                .into_response()
        })?;

        if let Err(error) = value.validate() {
            tracing::warn!(
                field = ?error.field,
                code = %error.code,
                message = %error.message,
                "Validation failed"
            );
            return Err(ValidationRejection::from(error).into_response());
        }

        Ok(ValidatedJson(value))
    }
}

// ============================================================================
// Tests
// ============================================================================
