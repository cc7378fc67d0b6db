//! API Key entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned API key identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(i64);

impl ApiKeyId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An API key about to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewApiKey {
    pub key: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl NewApiKey {
    pub fn new(key: impl Into<String>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            created_at,
        }
    }

    pub fn into_api_key(self, id: ApiKeyId) -> ApiKey {
        ApiKey {
            id,
            key: self.key,
            name: self.name,
            is_active: true,
            created_at: self.created_at,
            last_used_at: None,
            request_count: 0,
        }
    }
}

/// A persisted API key gating the programmatic generation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: ApiKeyId,
    /// The secret presented by clients
    pub key: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    pub request_count: u64,
}

impl ApiKey {
    /// Record an authenticated request
    pub fn record_usage(&mut self, now: DateTime<Utc>) {
        self.last_used_at = Some(now);
        self.request_count += 1;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Leading characters of the secret, safe to log
    pub fn key_prefix(&self) -> &str {
        let end = self
            .key
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.key.len());
        &self.key[..end]
    }
}

/// Outcome of rotating the active key
#[derive(Debug, Clone, PartialEq)]
pub struct RotatedApiKey {
    /// The key that was deactivated, if one was active
    pub previous: Option<ApiKey>,
    pub current: ApiKey,
}
