//! Activation code repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::entity::{ActivationCode, CodeId, NewActivationCode};
use super::query::{CodeQuery, Page, StatusFilter, TimeWindow};
use super::validity::Redemption;
use crate::domain::DomainError;

/// Persistence for activation codes
///
/// Every mutating method is a single atomic step against the backing store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ActivationCodeRepository: Send + Sync {
    /// Insert a new code; fails with `Conflict` when the code string exists
    async fn insert(&self, code: NewActivationCode) -> Result<ActivationCode, DomainError>;

    async fn get(&self, id: CodeId) -> Result<Option<ActivationCode>, DomainError>;

    /// Look up by code string (compared in normalized uppercase form)
    async fn find_by_code(&self, code: &str) -> Result<Option<ActivationCode>, DomainError>;

    /// Permanently remove a code, returns true if it existed
    async fn delete(&self, id: CodeId) -> Result<bool, DomainError>;

    /// Flip `is_active`, returning the updated record
    async fn toggle_active(&self, id: CodeId) -> Result<Option<ActivationCode>, DomainError>;

    /// Consume one use if the code is currently valid.
    ///
    /// Never increments `uses_count` past `uses_allowed`, even under
    /// concurrent calls for the same code.
    async fn redeem(
        &self,
        code: &str,
        now: DateTime<Utc>,
        redeemed_by: Option<String>,
    ) -> Result<Redemption, DomainError>;

    /// Filtered, searched page ordered by creation time, newest first
    async fn list(&self, query: &CodeQuery) -> Result<Page<ActivationCode>, DomainError>;

    /// Every code matching the filter, newest first
    async fn list_all(&self, status: StatusFilter) -> Result<Vec<ActivationCode>, DomainError>;

    /// Bounded substring search, newest first
    async fn search(&self, term: &str, limit: u32) -> Result<Vec<ActivationCode>, DomainError>;

    /// Most recently created codes
    async fn recent(&self, limit: u32) -> Result<Vec<ActivationCode>, DomainError>;

    /// Most recently redeemed codes, by `used_at`
    async fn recently_redeemed(&self, limit: u32) -> Result<Vec<ActivationCode>, DomainError>;

    async fn count(&self, status: StatusFilter) -> Result<u64, DomainError>;

    async fn count_created_between(&self, window: TimeWindow) -> Result<u64, DomainError>;

    async fn count_used_between(&self, window: TimeWindow) -> Result<u64, DomainError>;
}
