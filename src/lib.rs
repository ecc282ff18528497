//! # Gatehouse
//!
//! Token lifecycle and role-based access control core for multi-tenant Axum
//! applications.
//!
//! This crate covers the part of an auth system with real invariant
//! structure: credential verification, issuance of paired access/refresh
//! tokens, stateless token verification, and the authorization gate that
//! enforces role membership before a protected operation runs. Transport,
//! configuration loading, and storage engines are collaborators at the edges.
//!
//! ## Features
//!
//! - **Token Lifecycle** (IA-2): HS256 access/refresh tokens with distinct
//!   claim shapes and lifetimes; expiry enforced as a hard post-condition
//! - **RBAC Gate** (AC-3): bearer extraction, role membership, 401/403 split
//! - **Password Hashing** (IA-5): Argon2id with embedded salts
//! - **Credential Store** (SC-28): PostgreSQL via sqlx, plus an in-memory
//!   store for single-process use and tests
//! - **Secure Errors** (SI-11): typed taxonomy, stable categories, no
//!   internal detail in responses
//! - **Audit Logging** (AU-2, AU-3): structured security events via tracing
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use gatehouse::{
//!     create_pool, AppState, AuthConfig, AuthorizationGate, AuthService,
//!     DatabaseConfig, PasswordHasher, PgCredentialStore, TokenService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AuthConfig::from_env()?;
//!     let pool = create_pool(&DatabaseConfig::from_env()?).await?;
//!
//!     let tokens = TokenService::from_config(&config);
//!     let store = Arc::new(PgCredentialStore::new(pool));
//!     let auth = Arc::new(AuthService::new(store, PasswordHasher::new(), tokens.clone()));
//!
//!     let app = gatehouse::router(AppState {
//!         auth,
//!         gate: AuthorizationGate::new(tokens),
//!     });
//!
//!     // Serve with axum...
//!     Ok(())
//! }
//! ```

mod config;
#[cfg(feature = "postgres")]
mod database;
mod error;
mod gate;
mod models;
pub mod observability;
mod parse;
mod password;
mod role;
mod routes;
mod secret;
mod service;
mod store;
mod token;
pub mod validation;

// Re-exports
pub use config::{AuthConfig, ConfigError, DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL};
pub use error::{AuthError, ErrorResponse};
pub use gate::{require_roles, AuthContext, AuthorizationGate};
pub use models::{
    AccessTokenResponse, LoginInput, MessageResponse, RefreshInput, RegisterInput, User,
};
pub use parse::parse_duration;
pub use password::{HashError, PasswordHasher};
pub use role::{Role, UnknownRole};
pub use routes::{router, AppState};
pub use secret::{SecretError, SecretPolicy};
pub use service::{AuthService, TokenPair};
pub use store::{CredentialStore, MemoryCredentialStore, StoreError};
pub use token::{AccessClaims, RefreshClaims, TokenError, TokenService};
pub use validation::{Validate, ValidatedJson, ValidationError};

#[cfg(feature = "postgres")]
pub use database::{create_pool, health_check, DatabaseConfig, DatabaseError, SslMode};
#[cfg(feature = "postgres")]
pub use store::PgCredentialStore;
