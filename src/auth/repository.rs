//! User/token repository collaborator.
//!
//! The auth core and identity resolver depend only on [`AuthRepository`].
//! [`PgRepository`] is the production implementation; [`MemoryRepository`]
//! backs tests and single-process demos.

use crate::auth::error::AuthError;
use crate::auth::models::{AuthToken, Authenticatable, TokenAttributes, User};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::Instrument;

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_token_by_value(&self, token: &str) -> Result<Option<AuthToken>, AuthError>;

    async fn find_user_by_id(&self, id: &str)
        -> Result<Option<Arc<dyn Authenticatable>>, AuthError>;

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Arc<dyn Authenticatable>>, AuthError>;

    async fn persist_token(&self, record: &AuthToken) -> Result<(), AuthError>;

    /// Point delete; removing a missing token is not an error.
    async fn delete_token(&self, token: &str) -> Result<(), AuthError>;
}

/// Postgres-backed repository, see `db/sql/01_easyauth.sql` for the schema.
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn repository_error(err: sqlx::Error, what: &'static str) -> AuthError {
    AuthError::Repository(anyhow::Error::new(err).context(what))
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password: row.get("password"),
        active: row.get("active"),
        real: row.get("is_real"),
        user_type: row.get("user_type"),
    }
}

#[async_trait]
impl AuthRepository for PgRepository {
    async fn find_token_by_value(&self, token: &str) -> Result<Option<AuthToken>, AuthError> {
        let query = "SELECT token, user_id, attributes FROM auth_tokens WHERE token = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| repository_error(err, "failed to lookup auth token"))?;

        Ok(row.map(|row| {
            let attributes: serde_json::Value = row.get("attributes");
            AuthToken {
                token: row.get("token"),
                user_id: row.get("user_id"),
                attributes: serde_json::from_value::<TokenAttributes>(attributes)
                    .unwrap_or_default(),
            }
        }))
    }

    async fn find_user_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Arc<dyn Authenticatable>>, AuthError> {
        let query =
            "SELECT id, email, password, active, is_real, user_type FROM users WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| repository_error(err, "failed to lookup user by id"))?;

        Ok(row.map(|row| Arc::new(user_from_row(&row)) as Arc<dyn Authenticatable>))
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Arc<dyn Authenticatable>>, AuthError> {
        let query =
            "SELECT id, email, password, active, is_real, user_type FROM users WHERE email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| repository_error(err, "failed to lookup user by email"))?;

        Ok(row.map(|row| Arc::new(user_from_row(&row)) as Arc<dyn Authenticatable>))
    }

    async fn persist_token(&self, record: &AuthToken) -> Result<(), AuthError> {
        let query = "INSERT INTO auth_tokens (token, user_id, attributes) VALUES ($1, $2, $3)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let attributes = serde_json::to_value(&record.attributes)
            .context("failed to serialize token attributes")
            .map_err(AuthError::Repository)?;
        sqlx::query(query)
            .bind(&record.token)
            .bind(&record.user_id)
            .bind(attributes)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| repository_error(err, "failed to persist auth token"))?;
        Ok(())
    }

    async fn delete_token(&self, token: &str) -> Result<(), AuthError> {
        let query = "DELETE FROM auth_tokens WHERE token = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(token)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| repository_error(err, "failed to delete auth token"))?;
        Ok(())
    }
}

/// In-process repository for tests and demos.
#[derive(Default)]
pub struct MemoryRepository {
    users: Mutex<HashMap<String, User>>,
    tokens: Mutex<HashMap<String, AuthToken>>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        if let Ok(mut users) = self.users.lock() {
            users.insert(user.id.clone(), user);
        }
    }

    pub fn token_count(&self) -> usize {
        self.tokens.lock().map(|tokens| tokens.len()).unwrap_or(0)
    }
}

fn lock_error() -> AuthError {
    AuthError::Repository(anyhow::anyhow!("repository lock poisoned"))
}

#[async_trait]
impl AuthRepository for MemoryRepository {
    async fn find_token_by_value(&self, token: &str) -> Result<Option<AuthToken>, AuthError> {
        let tokens = self.tokens.lock().map_err(|_| lock_error())?;
        Ok(tokens.get(token).cloned())
    }

    async fn find_user_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Arc<dyn Authenticatable>>, AuthError> {
        let users = self.users.lock().map_err(|_| lock_error())?;
        Ok(users
            .get(id)
            .cloned()
            .map(|user| Arc::new(user) as Arc<dyn Authenticatable>))
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Arc<dyn Authenticatable>>, AuthError> {
        let users = self.users.lock().map_err(|_| lock_error())?;
        Ok(users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .map(|user| Arc::new(user) as Arc<dyn Authenticatable>))
    }

    async fn persist_token(&self, record: &AuthToken) -> Result<(), AuthError> {
        let mut tokens = self.tokens.lock().map_err(|_| lock_error())?;
        tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn delete_token(&self, token: &str) -> Result<(), AuthError> {
        let mut tokens = self.tokens.lock().map_err(|_| lock_error())?;
        tokens.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> User {
        User {
            id: "u1".to_string(),
            email: "alice@example.com".to_string(),
            password: "phc".to_string(),
            active: true,
            real: true,
            user_type: "member".to_string(),
        }
    }

    #[tokio::test]
    async fn memory_repository_finds_users() {
        let repo = MemoryRepository::new();
        repo.add_user(sample_user());

        let by_id = repo.find_user_by_id("u1").await.unwrap();
        assert_eq!(by_id.map(|user| user.email().to_string()).as_deref(), Some("alice@example.com"));

        let by_email = repo.find_user_by_email("alice@example.com").await.unwrap();
        assert_eq!(by_email.map(|user| user.id().to_string()).as_deref(), Some("u1"));

        assert!(repo.find_user_by_id("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_repository_token_lifecycle() {
        let repo = MemoryRepository::new();
        let mut attributes = TokenAttributes::new();
        attributes.insert("device".to_string(), json!("cli"));
        let record = AuthToken::new("deadbeef".to_string(), "u1".to_string(), attributes);

        repo.persist_token(&record).await.unwrap();
        let found = repo.find_token_by_value("deadbeef").await.unwrap().unwrap();
        assert_eq!(found.user_id, "u1");
        assert_eq!(found.attributes.get("device"), Some(&json!("cli")));

        repo.delete_token("deadbeef").await.unwrap();
        assert!(repo.find_token_by_value("deadbeef").await.unwrap().is_none());

        // Deleting an absent token stays quiet.
        repo.delete_token("deadbeef").await.unwrap();
    }
}
