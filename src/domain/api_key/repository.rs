//! API Key repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entity::{ApiKey, NewApiKey, RotatedApiKey};
use crate::domain::DomainError;

/// Repository trait for API key storage
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Persist a new active key
    async fn create(&self, api_key: NewApiKey) -> Result<ApiKey, DomainError>;

    /// Find an active key by exact secret match and record the request
    /// (`last_used_at`, `request_count`) in the same atomic step
    async fn touch_active(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ApiKey>, DomainError>;

    /// The first active key by id, if any
    async fn first_active(&self) -> Result<Option<ApiKey>, DomainError>;

    /// Deactivate the first active key and persist `replacement`, atomically
    async fn rotate(&self, replacement: NewApiKey) -> Result<RotatedApiKey, DomainError>;

    /// All keys ordered by id
    async fn list(&self) -> Result<Vec<ApiKey>, DomainError>;
}
