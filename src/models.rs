//! Data structures for authentication entities and the JSON surface.
//!
//! `User` is the persisted identity record; the input types are transient
//! request payloads that carry plaintext credentials only for the duration of
//! a login or registration and are dropped afterwards.

use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::validation::{
    validate_email, validate_length, validate_required, Validate, ValidationError,
};

/// A user identity record.
///
/// `password_hash` is the Argon2 PHC string, never the plaintext. The record
/// is created by registration and read by login/refresh; this core defines no
/// update or delete operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Store-assigned unique identifier
    pub id: i64,
    /// Unique email, case-sensitive as stored
    pub email: String,
    /// Argon2 PHC hash of the password
    pub password_hash: String,
    /// Role within the closed role set
    pub role: Role,
}

// ============================================================================
// Request Payloads
// ============================================================================

/// Payload for POST /auth/login
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl Validate for LoginInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_required(&self.email, "email")?;
        validate_required(&self.password, "password")?;
        Ok(())
    }
}

/// Payload for POST /auth/register
///
/// `role` deserializes into the closed [`Role`] enum, so an unknown role
/// never reaches the service layer.
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl Validate for RegisterInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_required(&self.password, "password")?;
        validate_length(&self.password, 1, 128, "password")?;
        Ok(())
    }
}

/// Payload for POST /auth/refresh
#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

impl Validate for RefreshInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_required(&self.refresh_token, "refresh_token")?;
        Ok(())
    }
}

// ============================================================================
// Response Payloads
// ============================================================================

/// Success body for POST /auth/refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Success body for POST /auth/register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
