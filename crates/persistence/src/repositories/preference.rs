//! Preference repository for database operations.

use async_trait::async_trait;
use domain::services::{PreferenceStore, StoreError};
use sqlx::PgPool;

use super::store_error;
use crate::metrics::QueryTimer;

/// Per-user key-value store backed by the user_preferences table.
#[derive(Clone)]
pub struct PgPreferenceStore {
    pool: PgPool,
}

impl PgPreferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for PgPreferenceStore {
    async fn get(
        &self,
        user: &str,
        namespace: &str,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let timer = QueryTimer::new("get_preference");
        let result = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value FROM user_preferences
            WHERE username = $1 AND namespace = $2 AND key = $3
            "#,
        )
        .bind(user)
        .bind(namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result.map_err(store_error)
    }

    async fn set(
        &self,
        user: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let timer = QueryTimer::new("set_preference");
        let result = sqlx::query(
            r#"
            INSERT INTO user_preferences (username, namespace, key, value)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username, namespace, key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(user)
        .bind(namespace)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|_| ()).map_err(store_error)
    }

    async fn delete(&self, user: &str, namespace: &str, key: &str) -> Result<(), StoreError> {
        let timer = QueryTimer::new("delete_preference");
        let result = sqlx::query(
            r#"
            DELETE FROM user_preferences
            WHERE username = $1 AND namespace = $2 AND key = $3
            "#,
        )
        .bind(user)
        .bind(namespace)
        .bind(key)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|_| ()).map_err(store_error)
    }
}
