//! In-memory API key repository implementation

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, NewApiKey, RotatedApiKey};
use crate::domain::DomainError;

use super::generator::constant_time_compare;

#[derive(Debug, Default)]
struct KeyTable {
    next_id: i64,
    rows: BTreeMap<ApiKeyId, ApiKey>,
}

impl KeyTable {
    fn insert(&mut self, api_key: NewApiKey) -> Result<ApiKey, DomainError> {
        if self.rows.values().any(|k| k.key == api_key.key) {
            return Err(DomainError::conflict("API key already exists"));
        }

        self.next_id += 1;
        let id = ApiKeyId::new(self.next_id);
        let stored = api_key.into_api_key(id);
        self.rows.insert(id, stored.clone());

        Ok(stored)
    }
}

/// In-memory implementation of ApiKeyRepository
#[derive(Debug, Default)]
pub struct InMemoryApiKeyRepository {
    table: RwLock<KeyTable>,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn create(&self, api_key: NewApiKey) -> Result<ApiKey, DomainError> {
        self.table.write().await.insert(api_key)
    }

    async fn touch_active(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ApiKey>, DomainError> {
        let mut table = self.table.write().await;

        Ok(table
            .rows
            .values_mut()
            .find(|k| k.is_active && constant_time_compare(&k.key, key))
            .map(|k| {
                k.record_usage(now);
                k.clone()
            }))
    }

    async fn first_active(&self) -> Result<Option<ApiKey>, DomainError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|k| k.is_active).cloned())
    }

    async fn rotate(&self, replacement: NewApiKey) -> Result<RotatedApiKey, DomainError> {
        let mut table = self.table.write().await;

        let previous = table
            .rows
            .values_mut()
            .find(|k| k.is_active)
            .map(|k| {
                k.deactivate();
                k.clone()
            });

        let current = match table.insert(replacement) {
            Ok(current) => current,
            Err(e) => {
                if let Some(previous) = &previous {
                    if let Some(restored) = table.rows.get_mut(&previous.id) {
                        restored.is_active = true;
                    }
                }
                return Err(e);
            }
        };

        Ok(RotatedApiKey { previous, current })
    }

    async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }
}
