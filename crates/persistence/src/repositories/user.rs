//! User repository for database operations.

use async_trait::async_trait;
use domain::services::{StoreError, UserDirectory};
use shared::password::hash_password;
use sqlx::PgPool;

use super::store_error;
use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// User store backed by the users table. Passwords are kept as Argon2id hashes.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Creates a new PgUserDirectory with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_username");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT username, password_hash, display_name, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("user_exists");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result.map_err(store_error)
    }

    /// Inserts the account. A concurrent insert of the same name yields `false`.
    async fn create(&self, name: &str, password: &str) -> Result<bool, StoreError> {
        let password_hash =
            hash_password(password).map_err(|e| StoreError::Backend(e.to_string()))?;

        let timer = QueryTimer::new("create_user");
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(&password_hash)
        .execute(&self.pool)
        .await;
        timer.finish(&result);

        let created = result.map_err(store_error)?.rows_affected() == 1;
        if !created {
            tracing::debug!(username = %name, "User already present, insert skipped");
        }
        Ok(created)
    }

    async fn display_name(&self, id: &str) -> Result<String, StoreError> {
        match self.find_by_username(id).await.map_err(store_error)? {
            Some(user) => Ok(user.shown_name().to_string()),
            None => Err(StoreError::NotFound(format!("user {}", id))),
        }
    }

    async fn set_password(&self, name: &str, password: &str) -> Result<bool, StoreError> {
        let password_hash =
            hash_password(password).map_err(|e| StoreError::Backend(e.to_string()))?;

        let timer = QueryTimer::new("set_user_password");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE username = $1
            "#,
        )
        .bind(name)
        .bind(&password_hash)
        .execute(&self.pool)
        .await;
        timer.finish(&result);

        Ok(result.map_err(store_error)?.rows_affected() == 1)
    }
}
