//! Credential Store (IA-5, SC-28)
//!
//! Persistence for user identity records. The trait distinguishes absence
//! (`Ok(None)`) from failure (`Err`), so callers can map a missing user to an
//! authentication failure rather than a system fault, and duplicate emails
//! surface as a typed conflict distinct from backend errors.
//!
//! Two implementations:
//!
//! - [`PgCredentialStore`] - PostgreSQL via sqlx (feature `postgres`), the
//!   production store. Concurrency is owned by the connection pool.
//! - [`MemoryCredentialStore`] - in-memory, suitable for single-process use
//!   and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::models::User;
use crate::role::Role;

/// Credential store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The email already has a record; registration conflict
    #[error("email is already registered")]
    DuplicateEmail,
    /// Underlying persistence failure
    #[error("credential store failure: {0}")]
    Backend(String),
}

/// User identity persistence.
///
/// Implementations must be safely callable concurrently by many in-flight
/// requests.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create a user. Fails with [`StoreError::DuplicateEmail`] if the email
    /// already exists.
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError>;

    /// Look up a user by email. Absence is `Ok(None)`, not an error.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Look up a user by id. Absence is `Ok(None)`, not an error.
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
}

// ============================================================================
// PostgreSQL Store
// ============================================================================

#[cfg(feature = "postgres")]
pub use postgres::PgCredentialStore;

#[cfg(feature = "postgres")]
mod postgres {
    use std::str::FromStr;

    use sqlx::PgPool;

    use super::*;

    /// PostgreSQL-backed credential store.
    #[derive(Debug, Clone)]
    pub struct PgCredentialStore {
        pool: PgPool,
    }

    #[derive(sqlx::FromRow)]
    struct UserRow {
        id: i64,
        email: String,
        password_hash: String,
        role: String,
    }

    impl TryFrom<UserRow> for User {
        type Error = StoreError;

        fn try_from(row: UserRow) -> Result<Self, Self::Error> {
            // The role column carries a CHECK constraint, so this only fails
            // if the schema and the enum have drifted apart.
            let role = Role::from_str(&row.role)
                .map_err(|e| StoreError::Backend(format!("corrupt role column: {}", e)))?;
            Ok(User {
                id: row.id,
                email: row.email,
                password_hash: row.password_hash,
                role,
            })
        }
    }

    impl PgCredentialStore {
        /// Create a store over an initialized connection pool.
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }
    }

    #[async_trait]
    impl CredentialStore for PgCredentialStore {
        async fn create_user(
            &self,
            email: &str,
            password_hash: &str,
            role: Role,
        ) -> Result<User, StoreError> {
            let row: UserRow = sqlx::query_as(
                "INSERT INTO users (email, password_hash, role) \
                 VALUES ($1, $2, $3) \
                 RETURNING id, email, password_hash, role",
            )
            .bind(email)
            .bind(password_hash)
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)?;

            row.try_into()
        }

        async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            let row: Option<UserRow> = sqlx::query_as(
                "SELECT id, email, password_hash, role FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

            row.map(User::try_from).transpose()
        }

        async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
            let row: Option<UserRow> = sqlx::query_as(
                "SELECT id, email, password_hash, role FROM users WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

            row.map(User::try_from).transpose()
        }
    }

    fn map_insert_error(err: sqlx::Error) -> StoreError {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-memory credential store for single-process deployments and tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    users: HashMap<i64, User>,
    next_id: i64,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a user's role in place. Returns `false` if the id is unknown.
    pub fn set_role(&self, id: i64, role: Role) -> bool {
        let mut inner = self.inner.write().expect("store lock poisoned");
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.role = role;
                true
            }
            None => false,
        }
    }

    /// Remove a user record. Returns `false` if the id is unknown.
    pub fn remove_user(&self, id: i64) -> bool {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.users.remove(&id).is_some()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().expect("store lock poisoned").users.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");

        if inner.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.users.get(&id).cloned())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_fetch_roundtrip() {
        let store = MemoryCredentialStore::new();
        let created = store
            .create_user("a@x.com", "hash", Role::Admin)
            .await
            .unwrap();

        let by_email = store.get_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email, created);

        let by_id = store.get_user_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id, created);
    }

    #[tokio::test]
    async fn test_duplicate_email_keeps_single_record() {
        let store = MemoryCredentialStore::new();
        store
            .create_user("a@x.com", "hash1", Role::Student)
            .await
            .unwrap();

        let err = store
            .create_user("a@x.com", "hash2", Role::Teacher)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail);
        assert_eq!(store.len(), 1);

        // The surviving record is the first one.
        let user = store.get_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(user.password_hash, "hash1");
        assert_eq!(user.role, Role::Student);
    }

    #[tokio::test]
    async fn test_absence_is_none_not_error() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get_user_by_email("ghost@x.com").await.unwrap(), None);
        assert_eq!(store.get_user_by_id(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = MemoryCredentialStore::new();
        store
            .create_user("a@x.com", "hash", Role::Student)
            .await
            .unwrap();
        assert_eq!(store.get_user_by_email("A@X.COM").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_role_and_remove() {
        let store = MemoryCredentialStore::new();
        let user = store
            .create_user("a@x.com", "hash", Role::Student)
            .await
            .unwrap();

        assert!(store.set_role(user.id, Role::Admin));
        let updated = store.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.role, Role::Admin);

        assert!(store.remove_user(user.id));
        assert!(!store.remove_user(user.id));
        assert!(store.is_empty());
    }
}
