//! Database schema migrations
//!
//! Migrations are applied in version order and recorded in `_migrations`,
//! so running them against an existing database is a no-op.

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// PostgreSQL migrator
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Apply a single migration unless already recorded
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
                .bind(migration.version)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to check migration status: {}", e))
                })?;

        if applied {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin migration: {}", e)))?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        Ok(true)
    }
}

/// A versioned schema change
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up: &'static str,
}

/// Schema for the code and key tables
pub fn schema_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Create activation_codes table",
            up: r#"
            CREATE TABLE IF NOT EXISTS activation_codes (
                id BIGSERIAL PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name TEXT,
                is_used BOOLEAN NOT NULL DEFAULT FALSE,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                uses_allowed INTEGER NOT NULL DEFAULT 1 CHECK (uses_allowed >= 1),
                uses_count INTEGER NOT NULL DEFAULT 0 CHECK (uses_count >= 0),
                expires_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                used_at TIMESTAMPTZ,
                used_by TEXT,
                CHECK (uses_count <= uses_allowed)
            );
            CREATE INDEX IF NOT EXISTS idx_activation_codes_created_at ON activation_codes(created_at);
            CREATE INDEX IF NOT EXISTS idx_activation_codes_used_at ON activation_codes(used_at);
            "#,
        },
        Migration {
            version: 2,
            description: "Create api_keys table",
            up: r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                id BIGSERIAL PRIMARY KEY,
                key TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                last_used_at TIMESTAMPTZ,
                request_count BIGINT NOT NULL DEFAULT 0
            );
            "#,
        },
    ]
}

/// Apply all pending migrations
pub async fn run_schema_migrations(pool: &PgPool) -> Result<(), DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());

    for migration in schema_migrations() {
        if migrator.run_migration(&migration).await? {
            info!(
                version = migration.version,
                "Applied migration: {}", migration.description
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_migrations_order() {
        let migrations = schema_migrations();

        assert!(!migrations.is_empty());

        for pair in migrations.windows(2) {
            assert!(
                pair[1].version > pair[0].version,
                "Migrations should be in ascending order"
            );
        }
    }

    #[test]
    fn test_schema_migrations_content() {
        for migration in schema_migrations() {
            assert!(!migration.description.is_empty());
            assert!(migration.up.contains("CREATE TABLE IF NOT EXISTS"));
        }
    }

    #[test]
    fn test_code_table_enforces_use_bound() {
        let codes = &schema_migrations()[0];
        assert!(codes.up.contains("CHECK (uses_count <= uses_allowed)"));
        assert!(codes.up.contains("code TEXT NOT NULL UNIQUE"));
    }
}
