//! HTTP Surface
//!
//! Route wiring and handlers for the authentication endpoints. Handlers stay
//! thin: payloads are validated by the extractor, the service does the work,
//! and failures map to responses through [`AuthError`].
//!
//! | Method & path       | Auth          | Success                              |
//! |---------------------|---------------|--------------------------------------|
//! | POST /auth/login    | none          | 200 `{access_token, refresh_token}`  |
//! | POST /auth/refresh  | none          | 200 `{access_token}`                 |
//! | POST /auth/register | Bearer, admin | 201 `{message}`                      |

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::routing::post;
use axum::{Extension, Json, Router};
use tower_http::trace::TraceLayer;

use crate::error::AuthError;
use crate::gate::{require_roles, AuthContext, AuthorizationGate};
use crate::models::{AccessTokenResponse, LoginInput, MessageResponse, RefreshInput, RegisterInput};
use crate::role::Role;
use crate::service::{AuthService, TokenPair};
use crate::validation::ValidatedJson;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub gate: AuthorizationGate,
}

/// Build the authentication router.
pub fn router(state: AppState) -> Router {
    let admin_gate = state.gate.clone();

    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route(
            "/auth/register",
            post(register).layer(middleware::from_fn(move |req: Request, next: Next| {
                let gate = admin_gate.clone();
                async move { require_roles(gate, vec![Role::Admin], req, next).await }
            })),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<LoginInput>,
) -> Result<Json<TokenPair>, AuthError> {
    let pair = state.auth.login(&input.email, &input.password).await?;
    Ok(Json(pair))
}

async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RefreshInput>,
) -> Result<Json<AccessTokenResponse>, AuthError> {
    let access_token = state.auth.refresh(&input.refresh_token).await?;
    Ok(Json(AccessTokenResponse { access_token }))
}

async fn register(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    ValidatedJson(input): ValidatedJson<RegisterInput>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    state.auth.register(context.role, &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".to_string(),
        }),
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::*;
    use crate::password::PasswordHasher;
    use crate::store::{CredentialStore, MemoryCredentialStore};
    use crate::token::{AccessClaims, TokenService};

    const SECRET: &[u8] = b"unit-test-signing-key-0123456789";

    async fn app() -> (Arc<MemoryCredentialStore>, Router) {
        let store = Arc::new(MemoryCredentialStore::new());
        let tokens = TokenService::new(
            SECRET,
            Duration::from_secs(15 * 60),
            Duration::from_secs(7 * 24 * 60 * 60),
        );
        let hasher = PasswordHasher::new();

        // Bootstrap admin, the way a deployment would seed its first account.
        let hash = hasher.hash("bootpw").unwrap();
        store
            .create_user("boot@x.com", &hash, Role::Admin)
            .await
            .unwrap();

        let auth = Arc::new(AuthService::new(store.clone(), hasher, tokens.clone()));
        let state = AppState {
            auth,
            gate: AuthorizationGate::new(tokens),
        };
        (store, router(state))
    }

    fn post_json(uri: &str, body: Value, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login_tokens(app: &Router, email: &str, password: &str) -> (String, String) {
        let response = app
            .clone()
            .oneshot(post_json(
                "/auth/login",
                json!({"email": email, "password": password}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_login_refresh_register_flow() {
        let (_, app) = app().await;
        let (admin_access, _) = login_tokens(&app, "boot@x.com", "bootpw").await;

        // Admin registers a new admin account.
        let response = app
            .clone()
            .oneshot(post_json(
                "/auth/register",
                json!({"email": "a@x.com", "password": "pw123", "role": "admin"}),
                Some(&admin_access),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // The new account can log in and gets both tokens.
        let (_, refresh_token) = login_tokens(&app, "a@x.com", "pw123").await;

        // And its refresh token yields a fresh access token.
        let response = app
            .clone()
            .oneshot(post_json(
                "/auth/refresh",
                json!({"refresh_token": refresh_token}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["access_token"].is_string());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials_identically() {
        let (_, app) = app().await;

        for payload in [
            json!({"email": "ghost@x.com", "password": "bootpw"}),
            json!({"email": "boot@x.com", "password": "wrong"}),
        ] {
            let response = app
                .clone()
                .oneshot(post_json("/auth/login", payload, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = body_json(response).await;
            assert_eq!(body["error"], "invalid_credentials");
            assert_eq!(body["message"], "Invalid credentials");
        }
    }

    #[tokio::test]
    async fn test_login_missing_field_is_bad_request() {
        let (_, app) = app().await;
        let response = app
            .oneshot(post_json(
                "/auth/login",
                json!({"email": "boot@x.com", "password": ""}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_without_token_is_unauthorized() {
        let (_, app) = app().await;
        let response = app
            .oneshot(post_json(
                "/auth/register",
                json!({"email": "a@x.com", "password": "pw123", "role": "student"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_as_student_is_forbidden() {
        let (_, app) = app().await;
        let (admin_access, _) = login_tokens(&app, "boot@x.com", "bootpw").await;

        // Register a student, then try to use the student's token on register.
        let response = app
            .clone()
            .oneshot(post_json(
                "/auth/register",
                json!({"email": "s@x.com", "password": "pw123", "role": "student"}),
                Some(&admin_access),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let (student_access, _) = login_tokens(&app, "s@x.com", "pw123").await;
        let response = app
            .oneshot(post_json(
                "/auth/register",
                json!({"email": "t@x.com", "password": "pw123", "role": "teacher"}),
                Some(&student_access),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_register_with_expired_token_is_unauthorized() {
        let (store, app) = app().await;
        let admin = store.get_user_by_email("boot@x.com").await.unwrap().unwrap();

        let claims = AccessClaims {
            user_id: admin.id,
            role: Role::Admin,
            exp: Utc::now().timestamp() - 60,
        };
        let expired = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let response = app
            .oneshot(post_json(
                "/auth/register",
                json!({"email": "a@x.com", "password": "pw123", "role": "admin"}),
                Some(&expired),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "token_expired");
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let (_, app) = app().await;
        let (admin_access, _) = login_tokens(&app, "boot@x.com", "bootpw").await;

        let response = app
            .oneshot(post_json(
                "/auth/register",
                json!({"email": "boot@x.com", "password": "pw123", "role": "teacher"}),
                Some(&admin_access),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"], "duplicate_email");
    }

    #[tokio::test]
    async fn test_register_unknown_role_is_bad_request() {
        let (_, app) = app().await;
        let (admin_access, _) = login_tokens(&app, "boot@x.com", "bootpw").await;

        let response = app
            .oneshot(post_json(
                "/auth/register",
                json!({"email": "a@x.com", "password": "pw123", "role": "root"}),
                Some(&admin_access),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh_with_vanished_user_conflicts() {
        let (store, app) = app().await;
        let (_, refresh_token) = login_tokens(&app, "boot@x.com", "bootpw").await;

        let admin = store.get_user_by_email("boot@x.com").await.unwrap().unwrap();
        store.remove_user(admin.id);

        let response = app
            .oneshot(post_json(
                "/auth/refresh",
                json!({"refresh_token": refresh_token}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"], "user_not_found");
    }

    #[tokio::test]
    async fn test_refresh_with_invalid_token_is_unauthorized() {
        let (_, app) = app().await;
        let response = app
            .oneshot(post_json(
                "/auth/refresh",
                json!({"refresh_token": "not-a-token"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "token_invalid");
    }
}
