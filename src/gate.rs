//! Authorization Gate (AC-3)
//!
//! Enforces bearer-token authentication and role membership in front of
//! protected operations. The two failure modes are distinct on purpose:
//!
//! - `Unauthorized` (401): the caller has not proven identity at all -
//!   missing or malformed header, invalid or expired token.
//! - `Forbidden` (403): identity proven, but the role is not in the allowed
//!   set.
//!
//! On success the gate produces an [`AuthContext`] and, when used as
//! middleware, injects it as a request extension for downstream handlers.

use axum::extract::Request;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AuthError;
use crate::observability::SecurityEvent;
use crate::role::Role;
use crate::security_event;
use crate::token::TokenService;

/// Identity established for a request that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: Role,
}

/// Verifies bearer tokens and enforces role membership.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    tokens: TokenService,
}

impl AuthorizationGate {
    /// Create a gate backed by the given token service.
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    /// Authorize a request from its headers.
    ///
    /// An empty `allowed_roles` slice means any authenticated caller is
    /// accepted; membership is only checked when the slice is non-empty.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        allowed_roles: &[Role],
    ) -> Result<AuthContext, AuthError> {
        let token = bearer_token(headers)?;

        let claims = self.tokens.verify_access_token(token).map_err(|err| {
            security_event!(
                SecurityEvent::TokenRejected,
                reason = %err,
                "Access token rejected"
            );
            AuthError::from(err)
        })?;

        if !allowed_roles.is_empty() && !allowed_roles.contains(&claims.role) {
            security_event!(
                SecurityEvent::AccessDenied,
                user_id = claims.user_id,
                role = %claims.role,
                "Insufficient role"
            );
            return Err(AuthError::Forbidden);
        }

        security_event!(
            SecurityEvent::AccessGranted,
            user_id = claims.user_id,
            role = %claims.role,
            "Access granted"
        );

        Ok(AuthContext {
            user_id: claims.user_id,
            role: claims.role,
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Any other shape - missing header, different scheme, empty token - is
/// `Unauthorized`: the caller has not presented credentials at all.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::Unauthorized("Missing authorization header"))?;

    let value = header
        .to_str()
        .map_err(|_| AuthError::Unauthorized("Malformed authorization header"))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::Unauthorized("Malformed authorization header")),
    }
}

/// Middleware that runs the gate and injects [`AuthContext`] on success.
///
/// Wire it per-route with a closure that captures the gate and the allowed
/// role set:
///
/// ```ignore
/// use axum::{middleware, routing::post, Router};
///
/// let admin_gate = gate.clone();
/// let app: Router = Router::new().route(
///     "/auth/register",
///     post(register).layer(middleware::from_fn(move |req, next| {
///         let gate = admin_gate.clone();
///         async move { require_roles(gate, vec![Role::Admin], req, next).await }
///     })),
/// );
/// ```
pub async fn require_roles(
    gate: AuthorizationGate,
    allowed_roles: Vec<Role>,
    mut req: Request,
    next: Next,
) -> Response {
    match gate.authorize(req.headers(), &allowed_roles) {
        Ok(context) => {
            req.extensions_mut().insert(context);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::HeaderValue;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;
    use crate::models::User;
    use crate::token::AccessClaims;

    const SECRET: &[u8] = b"unit-test-signing-key-0123456789";

    fn gate() -> AuthorizationGate {
        AuthorizationGate::new(TokenService::new(
            SECRET,
            Duration::from_secs(900),
            Duration::from_secs(604_800),
        ))
    }

    fn user(role: Role) -> User {
        User {
            id: 9,
            email: "u@x.com".to_string(),
            password_hash: "hash".to_string(),
            role,
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn bearer(gate: &AuthorizationGate, role: Role) -> HeaderMap {
        let token = gate.tokens.issue_access_token(&user(role)).unwrap();
        headers_with(&format!("Bearer {}", token))
    }

    #[test]
    fn test_valid_token_yields_context() {
        let gate = gate();
        let headers = bearer(&gate, Role::Admin);

        let context = gate.authorize(&headers, &[Role::Admin]).unwrap();
        assert_eq!(context.user_id, 9);
        assert_eq!(context.role, Role::Admin);
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let gate = gate();
        let err = gate.authorize(&HeaderMap::new(), &[]).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[test]
    fn test_non_bearer_shapes_are_unauthorized() {
        let gate = gate();
        for value in ["Basic abc123", "Bearer", "Bearer ", "token-without-scheme"] {
            let err = gate.authorize(&headers_with(value), &[]).unwrap_err();
            assert!(matches!(err, AuthError::Unauthorized(_)), "shape: {value:?}");
        }
    }

    #[test]
    fn test_invalid_token_is_401_not_403() {
        let gate = gate();
        let headers = headers_with("Bearer not.a.token");
        let err = gate.authorize(&headers, &[Role::Admin]).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid));
    }

    #[test]
    fn test_expired_token_is_rejected_as_expired() {
        let gate = gate();
        let claims = AccessClaims {
            user_id: 9,
            role: Role::Admin,
            exp: Utc::now().timestamp() - 60,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        let headers = headers_with(&format!("Bearer {}", token));

        let err = gate.authorize(&headers, &[Role::Admin]).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn test_role_outside_allowed_set_is_forbidden() {
        let gate = gate();
        let headers = bearer(&gate, Role::Student);

        let err = gate.authorize(&headers, &[Role::Admin]).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));
    }

    #[test]
    fn test_empty_allowed_set_accepts_any_authenticated_caller() {
        let gate = gate();
        for role in Role::ALL {
            let headers = bearer(&gate, role);
            assert!(gate.authorize(&headers, &[]).is_ok());
        }
    }

    #[test]
    fn test_membership_accepts_any_listed_role() {
        let gate = gate();
        let allowed = [Role::Teacher, Role::Admin];

        assert!(gate.authorize(&bearer(&gate, Role::Teacher), &allowed).is_ok());
        assert!(gate.authorize(&bearer(&gate, Role::Admin), &allowed).is_ok());
        assert!(matches!(
            gate.authorize(&bearer(&gate, Role::Student), &allowed),
            Err(AuthError::Forbidden)
        ));
    }
}
