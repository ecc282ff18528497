//! Token Issuance and Verification (IA-2, SC-12)
//!
//! Stateless HS256 bearer tokens with two variants:
//!
//! - **Access tokens** are short-lived and carry the role, so authorization
//!   decisions on the hot path need no store round-trip.
//! - **Refresh tokens** are long-lived and carry identity only; the caller
//!   must re-resolve the user's current role from the store before issuing a
//!   new access token, so demotions take effect on the next refresh.
//!
//! Splitting the claim shapes and lifetimes bounds the blast radius of a leak:
//! a stolen access token expires quickly, and a stolen refresh token cannot
//! authorize a privileged action without the store round-trip.
//!
//! Verification is a pure function of the token, the signing secret, and the
//! current time. Only HS256 is accepted - a token signed with any other
//! algorithm (including `none`) is invalid regardless of its payload - and
//! expiry is re-checked after library validation as a hard post-condition.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::models::User;
use crate::role::Role;

// ============================================================================
// Claims
// ============================================================================

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Identity of the authenticated user
    pub user_id: i64,
    /// Role at issuance time
    pub role: Role,
    /// Expiry as a Unix timestamp (seconds)
    pub exp: i64,
}

/// Claims carried by a refresh token.
///
/// Deliberately role-free: the role is re-resolved from the store on refresh.
/// Unknown fields are rejected so an access token (which carries `role`)
/// cannot pass verification as a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    /// Identity of the authenticated user
    pub user_id: i64,
    /// Expiry as a Unix timestamp (seconds)
    pub exp: i64,
}

// ============================================================================
// Errors
// ============================================================================

/// Token verification and issuance failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Signature, format, claim-shape, or algorithm check failed
    #[error("token is invalid")]
    Invalid,
    /// Signature verified but the token is past its expiry
    #[error("token has expired")]
    Expired,
    /// Signing backend failure during issuance
    #[error("token signing failed: {0}")]
    Signing(String),
}

// ============================================================================
// Token Service
// ============================================================================

/// Issues and verifies access and refresh tokens.
///
/// Holds the process-wide signing secret in key form; constructed once at
/// startup and shared read-only, so concurrent use needs no synchronization.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Create a token service from raw secret bytes and token lifetimes.
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Create a token service from validated configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.access_ttl,
            config.refresh_ttl,
        )
    }

    /// Issue an access token carrying the user's identity and role.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let claims = AccessClaims {
            user_id: user.id,
            role: user.role,
            exp: self.expiry(self.access_ttl),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Issue a refresh token carrying identity only.
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, TokenError> {
        let claims = RefreshClaims {
            user_id: user.id,
            exp: self.expiry(self.refresh_ttl),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify an access token's signature, algorithm, shape, and expiry.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.decode_claims(token)?;
        self.check_expiry(claims.exp)?;
        Ok(claims)
    }

    /// Verify a refresh token's signature, algorithm, shape, and expiry.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.decode_claims(token)?;
        self.check_expiry(claims.exp)?;
        Ok(claims)
    }

    fn expiry(&self, ttl: Duration) -> i64 {
        Utc::now().timestamp() + ttl.as_secs() as i64
    }

    fn decode_claims<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        // HS256 only; no leeway, so expiry holds to the second.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    // Expiry is a hard post-condition, enforced here independently of the
    // library's own validation.
    fn check_expiry(&self, exp: i64) -> Result<(), TokenError> {
        if exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material is never printed.
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"unit-test-signing-key-0123456789";

    fn service() -> TokenService {
        TokenService::new(
            SECRET,
            Duration::from_secs(15 * 60),
            Duration::from_secs(7 * 24 * 60 * 60),
        )
    }

    fn sample_user() -> User {
        User {
            id: 7,
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Teacher,
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let svc = service();
        let user = sample_user();

        let token = svc.issue_access_token(&user).unwrap();
        let claims = svc.verify_access_token(&token).unwrap();

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.role, user.role);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_refresh_token_roundtrip_has_no_role() {
        let svc = service();
        let token = svc.issue_refresh_token(&sample_user()).unwrap();
        let claims = svc.verify_refresh_token(&token).unwrap();
        assert_eq!(claims.user_id, 7);
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service();
        let claims = AccessClaims {
            user_id: 7,
            role: Role::Teacher,
            exp: Utc::now().timestamp() - 60,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(svc.verify_access_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let svc = service();
        let other = TokenService::new(
            b"some-other-signing-key-987654321",
            Duration::from_secs(900),
            Duration::from_secs(900),
        );
        let token = other.issue_access_token(&sample_user()).unwrap();

        assert_eq!(svc.verify_access_token(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_unexpected_algorithm_rejected() {
        let svc = service();
        let claims = AccessClaims {
            user_id: 7,
            role: Role::Admin,
            exp: Utc::now().timestamp() + 600,
        };
        // Same secret, different HMAC variant: must not verify.
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(svc.verify_access_token(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let svc = service();
        assert_eq!(svc.verify_access_token(""), Err(TokenError::Invalid));
        assert_eq!(
            svc.verify_access_token("not.a.token"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let svc = service();
        let user = sample_user();

        // The role claim makes the access token fail the refresh claim shape.
        let access = svc.issue_access_token(&user).unwrap();
        assert_eq!(svc.verify_refresh_token(&access), Err(TokenError::Invalid));

        // And the refresh token lacks the required role claim.
        let refresh = svc.issue_refresh_token(&user).unwrap();
        assert_eq!(svc.verify_access_token(&refresh), Err(TokenError::Invalid));
    }
}
