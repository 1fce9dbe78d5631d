//! Group repository for database operations.

use async_trait::async_trait;
use domain::services::{GroupDirectory, StoreError};
use sqlx::PgPool;

use super::store_error;
use crate::entities::GroupEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PgGroupDirectory {
    pool: PgPool,
}

impl PgGroupDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a group if it does not exist yet.
    pub async fn ensure_group(&self, name: &str) -> Result<GroupEntity, sqlx::Error> {
        let timer = QueryTimer::new("ensure_group");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            INSERT INTO groups (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }
}

#[async_trait]
impl GroupDirectory for PgGroupDirectory {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("group_exists");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM groups WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result.map_err(store_error)
    }

    async fn add_member(&self, user: &str, group: &str) -> Result<(), StoreError> {
        let timer = QueryTimer::new("add_group_member");
        let result = sqlx::query(
            r#"
            INSERT INTO group_memberships (group_name, username)
            VALUES ($1, $2)
            ON CONFLICT (group_name, username) DO NOTHING
            "#,
        )
        .bind(group)
        .bind(user)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|_| ()).map_err(store_error)
    }

    async fn is_member(&self, user: &str, group: &str) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("is_group_member");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM group_memberships WHERE group_name = $1 AND username = $2
            )
            "#,
        )
        .bind(group)
        .bind(user)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result.map_err(store_error)
    }
}
