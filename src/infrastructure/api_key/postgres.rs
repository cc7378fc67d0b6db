//! PostgreSQL API key repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, NewApiKey, RotatedApiKey};
use crate::domain::DomainError;
use crate::infrastructure::storage::map_write_error;

const COLUMNS: &str = "id, key, name, is_active, created_at, last_used_at, request_count";

/// API keys stored in the `api_keys` table
#[derive(Debug, Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_key(row: &PgRow) -> Result<ApiKey, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Malformed API key row: {}", e));
    let request_count: i64 = row.try_get("request_count").map_err(read)?;

    Ok(ApiKey {
        id: ApiKeyId::new(row.try_get("id").map_err(read)?),
        key: row.try_get("key").map_err(read)?,
        name: row.try_get("name").map_err(read)?,
        is_active: row.try_get("is_active").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
        last_used_at: row.try_get("last_used_at").map_err(read)?,
        request_count: request_count.max(0) as u64,
    })
}

fn insert_sql() -> String {
    format!(
        "INSERT INTO api_keys (key, name, created_at) VALUES ($1, $2, $3) RETURNING {}",
        COLUMNS
    )
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn create(&self, api_key: NewApiKey) -> Result<ApiKey, DomainError> {
        let row = sqlx::query(&insert_sql())
            .bind(&api_key.key)
            .bind(&api_key.name)
            .bind(api_key.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, || "API key already exists".to_string()))?;

        row_to_key(&row)
    }

    async fn touch_active(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ApiKey>, DomainError> {
        let sql = format!(
            r#"
            UPDATE api_keys
            SET last_used_at = $2, request_count = request_count + 1
            WHERE key = $1 AND is_active
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query(&sql)
            .bind(key)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to record API key use: {}", e)))?
            .as_ref()
            .map(row_to_key)
            .transpose()
    }

    async fn first_active(&self) -> Result<Option<ApiKey>, DomainError> {
        let sql = format!(
            "SELECT {} FROM api_keys WHERE is_active ORDER BY id LIMIT 1",
            COLUMNS
        );

        sqlx::query(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to load API key: {}", e)))?
            .as_ref()
            .map(row_to_key)
            .transpose()
    }

    async fn rotate(&self, replacement: NewApiKey) -> Result<RotatedApiKey, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let deactivate = format!(
            r#"
            UPDATE api_keys SET is_active = FALSE
            WHERE id = (
                SELECT id FROM api_keys WHERE is_active ORDER BY id LIMIT 1 FOR UPDATE
            )
            RETURNING {}
            "#,
            COLUMNS
        );

        let previous = sqlx::query(&deactivate)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to deactivate API key: {}", e)))?
            .as_ref()
            .map(row_to_key)
            .transpose()?;

        let row = sqlx::query(&insert_sql())
            .bind(&replacement.key)
            .bind(&replacement.name)
            .bind(replacement.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, || "API key already exists".to_string()))?;
        let current = row_to_key(&row)?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit key rotation: {}", e)))?;

        Ok(RotatedApiKey { previous, current })
    }

    async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        let sql = format!("SELECT {} FROM api_keys ORDER BY id", COLUMNS);

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list API keys: {}", e)))?;

        rows.iter().map(row_to_key).collect()
    }
}
