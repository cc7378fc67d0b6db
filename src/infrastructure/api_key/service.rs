//! API Key service
//!
//! Issues, rotates and authenticates the keys gating programmatic access.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::api_key::{ApiKey, ApiKeyRepository, NewApiKey, RotatedApiKey};
use crate::domain::DomainError;

use super::generator::ApiKeyGenerator;

pub const DEFAULT_KEY_NAME: &str = "Default API Key";
pub const REGENERATED_KEY_NAME: &str = "Regenerated API Key";

/// API Key service for managing API keys
#[derive(Debug)]
pub struct ApiKeyService<R>
where
    R: ApiKeyRepository,
{
    repository: Arc<R>,
    generator: ApiKeyGenerator,
}

impl<R: ApiKeyRepository> ApiKeyService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            generator: ApiKeyGenerator::default(),
        }
    }

    /// Issue a new active key; a blank name falls back to the default
    pub async fn issue(&self, name: Option<&str>, now: DateTime<Utc>) -> Result<ApiKey, DomainError> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_KEY_NAME);

        let created = self
            .repository
            .create(NewApiKey::new(self.generator.generate(), name, now))
            .await?;

        info!(id = %created.id, name = %created.name, "API key issued");
        Ok(created)
    }

    /// Validate a presented key and record the request against it
    pub async fn authenticate(&self, presented: &str, now: DateTime<Utc>) -> Result<ApiKey, DomainError> {
        let presented = presented.trim();

        if presented.is_empty() {
            return Err(DomainError::unauthorized("API key required"));
        }

        match self.repository.touch_active(presented, now).await? {
            Some(key) => {
                debug!(id = %key.id, requests = key.request_count, "API key accepted");
                Ok(key)
            }
            None => {
                debug!("Rejected unknown or inactive API key");
                Err(DomainError::unauthorized("Invalid API key"))
            }
        }
    }

    /// Replace the first active key with a freshly issued one
    pub async fn regenerate(&self, now: DateTime<Utc>) -> Result<RotatedApiKey, DomainError> {
        let replacement = NewApiKey::new(self.generator.generate(), REGENERATED_KEY_NAME, now);
        let rotated = self.repository.rotate(replacement).await?;

        info!(
            previous = ?rotated.previous.as_ref().map(|k| k.id),
            current = %rotated.current.id,
            "API key regenerated"
        );

        Ok(rotated)
    }

    /// The key shown on the API docs view
    pub async fn current(&self) -> Result<Option<ApiKey>, DomainError> {
        self.repository.first_active().await
    }

    pub async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        self.repository.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;

    fn create_service() -> ApiKeyService<InMemoryApiKeyRepository> {
        ApiKeyService::new(Arc::new(InMemoryApiKeyRepository::new()))
    }

    #[tokio::test]
    async fn test_issue_with_default_name() {
        let service = create_service();

        let key = service.issue(Some("   "), Utc::now()).await.unwrap();
        assert_eq!(key.name, DEFAULT_KEY_NAME);
        assert!(key.key.starts_with("cvk_"));
        assert!(key.is_active);

        let named = service.issue(Some(" CI "), Utc::now()).await.unwrap();
        assert_eq!(named.name, "CI");
    }

    #[tokio::test]
    async fn test_authenticate_counts_requests() {
        let service = create_service();
        let now = Utc::now();
        let key = service.issue(None, now).await.unwrap();

        service.authenticate(&key.key, now).await.unwrap();
        let second = service.authenticate(&key.key, now).await.unwrap();

        assert_eq!(second.request_count, 2);
        assert_eq!(second.last_used_at, Some(now));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_unknown_and_blank() {
        let service = create_service();
        service.issue(None, Utc::now()).await.unwrap();

        let unknown = service.authenticate("cvk_nope", Utc::now()).await;
        assert!(matches!(unknown, Err(DomainError::Unauthorized { .. })));

        let blank = service.authenticate("  ", Utc::now()).await;
        assert!(matches!(blank, Err(DomainError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_regenerate_revokes_old_key() {
        let service = create_service();
        let now = Utc::now();
        let original = service.issue(None, now).await.unwrap();

        let rotated = service.regenerate(now).await.unwrap();
        assert_eq!(rotated.previous.unwrap().id, original.id);
        assert_eq!(rotated.current.name, REGENERATED_KEY_NAME);

        assert!(service.authenticate(&original.key, now).await.is_err());
        assert!(service.authenticate(&rotated.current.key, now).await.is_ok());

        let current = service.current().await.unwrap().unwrap();
        assert_eq!(current.id, rotated.current.id);
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_current_without_keys() {
        let service = create_service();
        assert!(service.current().await.unwrap().is_none());
    }
}
