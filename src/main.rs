//! Service binary: configuration, storage bootstrap, and route serving.
//!
//! Startup is fail-fast: a missing signing secret, unreachable database, or
//! failed migration halts the process instead of serving degraded traffic.

use std::sync::Arc;

use anyhow::Context;

use gatehouse::observability::{self, ObservabilityConfig, SecurityEvent};
use gatehouse::{
    create_pool, security_event, AppState, AuthConfig, AuthService, AuthorizationGate,
    DatabaseConfig, PasswordHasher, PgCredentialStore, TokenService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init(ObservabilityConfig::from_env())
        .context("failed to initialize logging")?;

    let config = AuthConfig::from_env().context("invalid authentication configuration")?;

    let db_config = DatabaseConfig::from_env().context("invalid database configuration")?;
    let pool = create_pool(&db_config)
        .await
        .context("database startup failed")?;
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("database migration failed")?;

    let tokens = TokenService::from_config(&config);
    let store = Arc::new(PgCredentialStore::new(pool));
    let auth = Arc::new(AuthService::new(store, PasswordHasher::new(), tokens.clone()));

    let app = gatehouse::router(AppState {
        auth,
        gate: AuthorizationGate::new(tokens),
    });

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    security_event!(
        SecurityEvent::SystemStartup,
        addr = %addr,
        environment = %config.environment,
        "gatehouse listening"
    );

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
