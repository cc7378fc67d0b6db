//! PostgreSQL activation code repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::debug;

use crate::domain::activation_code::{
    normalize_code, ActivationCode, ActivationCodeRepository, CodeId, CodeQuery,
    NewActivationCode, Page, Redemption, StatusFilter, TimeWindow,
};
use crate::domain::DomainError;
use crate::infrastructure::storage::map_write_error;

const COLUMNS: &str = "id, code, name, is_used, is_active, uses_allowed, uses_count, \
                       expires_at, created_at, used_at, used_by";

const NEWEST_FIRST: &str = " ORDER BY created_at DESC, id DESC";

/// Attempts before a redemption that keeps losing races gives up
const REDEEM_ATTEMPTS: usize = 3;

/// Activation codes stored in the `activation_codes` table
///
/// Redemption is a single conditional UPDATE, so the use bound holds
/// across concurrent requests and server processes.
#[derive(Debug, Clone)]
pub struct PostgresActivationCodeRepository {
    pool: PgPool,
}

impl PostgresActivationCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_codes(
        &self,
        mut builder: QueryBuilder<'_, Postgres>,
        operation: &str,
    ) -> Result<Vec<ActivationCode>, DomainError> {
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to {}: {}", operation, e)))?;

        rows.iter().map(row_to_code).collect()
    }

    async fn count_where(&self, mut builder: QueryBuilder<'_, Postgres>) -> Result<u64, DomainError> {
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count codes: {}", e)))?;

        Ok(count.max(0) as u64)
    }
}

fn row_to_code(row: &PgRow) -> Result<ActivationCode, DomainError> {
    let read = |e: sqlx::Error| DomainError::storage(format!("Malformed code row: {}", e));

    let uses_allowed: i32 = row.try_get("uses_allowed").map_err(read)?;
    let uses_count: i32 = row.try_get("uses_count").map_err(read)?;

    Ok(ActivationCode {
        id: CodeId::new(row.try_get("id").map_err(read)?),
        code: row.try_get("code").map_err(read)?,
        name: row.try_get("name").map_err(read)?,
        is_used: row.try_get("is_used").map_err(read)?,
        is_active: row.try_get("is_active").map_err(read)?,
        uses_allowed: uses_allowed.max(1) as u32,
        uses_count: uses_count.max(0) as u32,
        expires_at: row.try_get("expires_at").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
        used_at: row.try_get("used_at").map_err(read)?,
        used_by: row.try_get("used_by").map_err(read)?,
    })
}

/// Escape LIKE metacharacters so the term matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn status_clause(status: StatusFilter) -> Option<&'static str> {
    match status {
        StatusFilter::All => None,
        StatusFilter::Valid => Some("is_active AND NOT is_used"),
        StatusFilter::Used => Some("is_used"),
        StatusFilter::Inactive => Some("NOT is_active"),
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, status: StatusFilter, search: Option<&str>) {
    let mut separator = " WHERE ";

    if let Some(clause) = status_clause(status) {
        builder.push(separator).push(clause);
        separator = " AND ";
    }

    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        builder
            .push(separator)
            .push("(code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR used_by ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl ActivationCodeRepository for PostgresActivationCodeRepository {
    async fn insert(&self, code: NewActivationCode) -> Result<ActivationCode, DomainError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO activation_codes (code, name, uses_allowed, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&code.code)
        .bind(&code.name)
        .bind(code.uses_allowed.min(i32::MAX as u32) as i32)
        .bind(code.expires_at)
        .bind(code.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, || format!("Activation code '{}' already exists", code.code))
        })?;

        Ok(code.into_code(CodeId::new(id)))
    }

    async fn get(&self, id: CodeId) -> Result<Option<ActivationCode>, DomainError> {
        let sql = format!("SELECT {} FROM activation_codes WHERE id = $1", COLUMNS);

        sqlx::query(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get code: {}", e)))?
            .as_ref()
            .map(row_to_code)
            .transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ActivationCode>, DomainError> {
        let sql = format!("SELECT {} FROM activation_codes WHERE code = $1", COLUMNS);

        sqlx::query(&sql)
            .bind(normalize_code(code))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up code: {}", e)))?
            .as_ref()
            .map(row_to_code)
            .transpose()
    }

    async fn delete(&self, id: CodeId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM activation_codes WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete code: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_active(&self, id: CodeId) -> Result<Option<ActivationCode>, DomainError> {
        let sql = format!(
            "UPDATE activation_codes SET is_active = NOT is_active WHERE id = $1 RETURNING {}",
            COLUMNS
        );

        sqlx::query(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to toggle code: {}", e)))?
            .as_ref()
            .map(row_to_code)
            .transpose()
    }

    async fn redeem(
        &self,
        code: &str,
        now: DateTime<Utc>,
        redeemed_by: Option<String>,
    ) -> Result<Redemption, DomainError> {
        let code = normalize_code(code);
        let redeemed_by = redeemed_by
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty());

        let sql = format!(
            r#"
            UPDATE activation_codes
            SET uses_count = uses_count + 1,
                is_used = uses_count + 1 >= uses_allowed,
                used_at = $2,
                used_by = COALESCE($3, used_by)
            WHERE code = $1
              AND is_active
              AND uses_count < uses_allowed
              AND (expires_at IS NULL OR expires_at >= $2)
            RETURNING {}
            "#,
            COLUMNS
        );

        for attempt in 1..=REDEEM_ATTEMPTS {
            let updated = sqlx::query(&sql)
                .bind(&code)
                .bind(now)
                .bind(&redeemed_by)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to redeem code: {}", e)))?;

            if let Some(row) = updated {
                return Ok(Redemption::Redeemed(row_to_code(&row)?));
            }

            let Some(current) = self.find_by_code(&code).await? else {
                return Ok(Redemption::NotFound);
            };

            let reason = current.check_validity(now);
            if !reason.is_valid() {
                return Ok(Redemption::Rejected {
                    code: current,
                    reason,
                });
            }

            debug!(code = %code, attempt, "Redemption raced a concurrent change, retrying");
        }

        Err(DomainError::storage(format!(
            "Redemption of '{}' did not settle after {} attempts",
            code, REDEEM_ATTEMPTS
        )))
    }

    async fn list(&self, query: &CodeQuery) -> Result<Page<ActivationCode>, DomainError> {
        let mut counter = QueryBuilder::new("SELECT COUNT(*) FROM activation_codes");
        push_filters(&mut counter, query.status, query.search.as_deref());
        let total = self.count_where(counter).await?;

        let mut builder = QueryBuilder::new(format!("SELECT {} FROM activation_codes", COLUMNS));
        push_filters(&mut builder, query.status, query.search.as_deref());
        builder
            .push(NEWEST_FIRST)
            .push(" LIMIT ")
            .push_bind(i64::from(query.per_page()))
            .push(" OFFSET ")
            .push_bind(query.offset().min(i64::MAX as u64) as i64);

        let items = self.fetch_codes(builder, "list codes").await?;

        Ok(Page::new(items, query.page(), query.per_page(), total))
    }

    async fn list_all(&self, status: StatusFilter) -> Result<Vec<ActivationCode>, DomainError> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM activation_codes", COLUMNS));
        push_filters(&mut builder, status, None);
        builder.push(NEWEST_FIRST);

        self.fetch_codes(builder, "export codes").await
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<ActivationCode>, DomainError> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::new(format!("SELECT {} FROM activation_codes", COLUMNS));
        push_filters(&mut builder, StatusFilter::All, Some(term));
        builder
            .push(NEWEST_FIRST)
            .push(" LIMIT ")
            .push_bind(i64::from(limit));

        self.fetch_codes(builder, "search codes").await
    }

    async fn recent(&self, limit: u32) -> Result<Vec<ActivationCode>, DomainError> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM activation_codes", COLUMNS));
        builder
            .push(NEWEST_FIRST)
            .push(" LIMIT ")
            .push_bind(i64::from(limit));

        self.fetch_codes(builder, "load recent codes").await
    }

    async fn recently_redeemed(&self, limit: u32) -> Result<Vec<ActivationCode>, DomainError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {} FROM activation_codes WHERE used_at IS NOT NULL \
             ORDER BY used_at DESC, id DESC LIMIT ",
            COLUMNS
        ));
        builder.push_bind(i64::from(limit));

        self.fetch_codes(builder, "load redeemed codes").await
    }

    async fn count(&self, status: StatusFilter) -> Result<u64, DomainError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM activation_codes");
        push_filters(&mut builder, status, None);

        self.count_where(builder).await
    }

    async fn count_created_between(&self, window: TimeWindow) -> Result<u64, DomainError> {
        let mut builder =
            QueryBuilder::new("SELECT COUNT(*) FROM activation_codes WHERE created_at BETWEEN ");
        builder
            .push_bind(window.start)
            .push(" AND ")
            .push_bind(window.end);

        self.count_where(builder).await
    }

    async fn count_used_between(&self, window: TimeWindow) -> Result<u64, DomainError> {
        let mut builder =
            QueryBuilder::new("SELECT COUNT(*) FROM activation_codes WHERE used_at BETWEEN ");
        builder
            .push_bind(window.start)
            .push(" AND ")
            .push_bind(window.end);

        self.count_where(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("promo"), "%promo%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_status_clauses() {
        assert_eq!(status_clause(StatusFilter::All), None);
        assert_eq!(status_clause(StatusFilter::Used), Some("is_used"));
        assert_eq!(status_clause(StatusFilter::Inactive), Some("NOT is_active"));
    }

    #[test]
    fn test_filters_join_with_and() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM activation_codes");
        push_filters(&mut builder, StatusFilter::Valid, Some("promo"));

        let sql = builder.sql();
        assert!(sql.contains("WHERE is_active AND NOT is_used AND (code ILIKE $1"));
        assert!(sql.contains("used_by ILIKE $3)"));
    }

    #[test]
    fn test_blank_search_adds_no_filter() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM activation_codes");
        push_filters(&mut builder, StatusFilter::All, Some("   "));

        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM activation_codes");
    }
}
