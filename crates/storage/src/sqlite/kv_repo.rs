use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{KeyValueStore, Scope, StorageError};

use super::SqliteRepository;

#[async_trait]
impl KeyValueStore for SqliteRepository {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE scope = ?1 AND key = ?2")
            .bind(scope.as_str())
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        row.try_get::<String, _>("value")
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO kv_entries (scope, key, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(scope, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(scope.as_str())
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn remove(&self, scope: Scope, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_entries WHERE scope = ?1 AND key = ?2")
            .bind(scope.as_str())
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }

    async fn clear_scope(&self, scope: Scope) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE scope = ?1")
            .bind(scope.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        log::debug!("cleared {} {scope} entries", result.rows_affected());
        Ok(())
    }
}
