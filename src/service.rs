//! Authentication Orchestration (IA-2, AC-3)
//!
//! Ties credential verification, password hashing, and token issuance
//! together into the three operations the HTTP surface exposes: login,
//! refresh, and admin-gated registration.
//!
//! Every operation is stateless with respect to the service itself; all
//! shared state lives in the credential store and the immutable signing key,
//! so concurrent requests need no coordination here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::models::{RegisterInput, User};
use crate::observability::SecurityEvent;
use crate::password::PasswordHasher;
use crate::role::Role;
use crate::security_event;
use crate::store::CredentialStore;
use crate::token::TokenService;

/// Both tokens issued by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates login, refresh, and registration.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AuthService {
    /// Create a service over a credential store, hasher, and token service.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: TokenService,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Verify credentials and issue an access/refresh token pair.
    ///
    /// Unknown email and wrong password produce the identical
    /// [`AuthError::InvalidCredentials`] outcome, and the unknown-email path
    /// still performs a hash verification so the two failures do comparable
    /// work.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = match self.store.get_user_by_email(email).await? {
            Some(user) => user,
            None => {
                self.hasher.verify_dummy(password);
                security_event!(
                    SecurityEvent::AuthenticationFailure,
                    email = %email,
                    "Login failed"
                );
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            security_event!(
                SecurityEvent::AuthenticationFailure,
                email = %email,
                "Login failed"
            );
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.tokens.issue_access_token(&user)?;
        let refresh_token = self.tokens.issue_refresh_token(&user)?;

        security_event!(
            SecurityEvent::AuthenticationSuccess,
            user_id = user.id,
            role = %user.role,
            "User authenticated"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a valid refresh token for a fresh access token.
    ///
    /// The user is re-fetched by the embedded id and the new access token
    /// carries the user's *current* role, so a role change takes effect on
    /// the next refresh. A vanished user is [`AuthError::UserNotFound`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.tokens.verify_refresh_token(refresh_token).map_err(|err| {
            security_event!(
                SecurityEvent::TokenRejected,
                reason = %err,
                "Refresh token rejected"
            );
            AuthError::from(err)
        })?;

        let user = self
            .store
            .get_user_by_id(claims.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let access_token = self.tokens.issue_access_token(&user)?;

        security_event!(
            SecurityEvent::TokenIssued,
            user_id = user.id,
            "Access token refreshed"
        );

        Ok(access_token)
    }

    /// Register a new user. Admin-only.
    ///
    /// The authorization gate enforces the admin requirement upstream; the
    /// re-check here keeps the invariant even if a future caller wires the
    /// service without the gate.
    pub async fn register(
        &self,
        requester_role: Role,
        input: &RegisterInput,
    ) -> Result<User, AuthError> {
        if requester_role != Role::Admin {
            security_event!(
                SecurityEvent::AccessDenied,
                role = %requester_role,
                resource = "register",
                "Non-admin registration attempt"
            );
            return Err(AuthError::Forbidden);
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let user = self
            .store
            .create_user(&input.email, &password_hash, input.role)
            .await?;

        security_event!(
            SecurityEvent::UserRegistered,
            user_id = user.id,
            role = %user.role,
            "User registered"
        );

        Ok(user)
    }

    /// The token service backing this orchestration.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

// ============================================================================
// Tests
// ============================================================================
