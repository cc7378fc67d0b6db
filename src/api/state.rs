//! Application state for shared services

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::activation_code::{
    ActivationCode, ActivationCodeRepository, CodeId, CodeQuery, Page, Redemption, StatusFilter,
};
use crate::domain::api_key::ApiKeyRepository;
use crate::domain::statistics::{CodeStatistics, DailyActivity};
use crate::domain::{ApiKey, DomainError, RotatedApiKey};
use crate::infrastructure::activation_code::{ActivationCodeService, GenerateCodesRequest};
use crate::infrastructure::api_key::ApiKeyService;
use crate::infrastructure::export::QrRenderer;
use crate::infrastructure::statistics::{Dashboard, StatisticsService};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub code_service: Arc<dyn CodeServiceTrait>,
    pub api_key_service: Arc<dyn ApiKeyServiceTrait>,
    pub statistics_service: Arc<dyn StatisticsServiceTrait>,
    pub qr_renderer: QrRenderer,
}

/// Trait for activation code service operations
#[async_trait::async_trait]
pub trait CodeServiceTrait: Send + Sync {
    async fn generate(
        &self,
        request: GenerateCodesRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActivationCode>, DomainError>;
    async fn redeem(
        &self,
        code: &str,
        user_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Redemption, DomainError>;
    async fn check(&self, code: &str) -> Result<Option<ActivationCode>, DomainError>;
    async fn toggle(&self, id: CodeId) -> Result<ActivationCode, DomainError>;
    async fn delete(&self, id: CodeId) -> Result<(), DomainError>;
    async fn list(&self, query: &CodeQuery) -> Result<Page<ActivationCode>, DomainError>;
    async fn search(&self, term: &str, limit: Option<u32>) -> Result<Vec<ActivationCode>, DomainError>;
    async fn export(&self, status: StatusFilter) -> Result<Vec<ActivationCode>, DomainError>;
}

/// Trait for API key service operations
#[async_trait::async_trait]
pub trait ApiKeyServiceTrait: Send + Sync {
    async fn issue(&self, name: Option<&str>, now: DateTime<Utc>) -> Result<ApiKey, DomainError>;
    async fn authenticate(&self, key: &str, now: DateTime<Utc>) -> Result<ApiKey, DomainError>;
    async fn regenerate(&self, now: DateTime<Utc>) -> Result<RotatedApiKey, DomainError>;
    async fn current(&self) -> Result<Option<ApiKey>, DomainError>;
    async fn list(&self) -> Result<Vec<ApiKey>, DomainError>;
}

/// Trait for statistics operations
#[async_trait::async_trait]
pub trait StatisticsServiceTrait: Send + Sync {
    async fn summary(&self, now: DateTime<Utc>) -> Result<CodeStatistics, DomainError>;
    async fn daily_series(
        &self,
        now: DateTime<Utc>,
        days: u32,
    ) -> Result<Vec<DailyActivity>, DomainError>;
    async fn dashboard(&self, now: DateTime<Utc>) -> Result<Dashboard, DomainError>;
}

#[async_trait::async_trait]
impl<R: ActivationCodeRepository + 'static> CodeServiceTrait for ActivationCodeService<R> {
    async fn generate(
        &self,
        request: GenerateCodesRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActivationCode>, DomainError> {
        ActivationCodeService::generate(self, request, now).await
    }

    async fn redeem(
        &self,
        code: &str,
        user_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Redemption, DomainError> {
        ActivationCodeService::redeem(self, code, user_name, now).await
    }

    async fn check(&self, code: &str) -> Result<Option<ActivationCode>, DomainError> {
        ActivationCodeService::check(self, code).await
    }

    async fn toggle(&self, id: CodeId) -> Result<ActivationCode, DomainError> {
        ActivationCodeService::toggle(self, id).await
    }

    async fn delete(&self, id: CodeId) -> Result<(), DomainError> {
        ActivationCodeService::delete(self, id).await
    }

    async fn list(&self, query: &CodeQuery) -> Result<Page<ActivationCode>, DomainError> {
        ActivationCodeService::list(self, query).await
    }

    async fn search(&self, term: &str, limit: Option<u32>) -> Result<Vec<ActivationCode>, DomainError> {
        ActivationCodeService::search(self, term, limit).await
    }

    async fn export(&self, status: StatusFilter) -> Result<Vec<ActivationCode>, DomainError> {
        ActivationCodeService::export(self, status).await
    }
}

#[async_trait::async_trait]
impl<R: ApiKeyRepository + 'static> ApiKeyServiceTrait for ApiKeyService<R> {
    async fn issue(&self, name: Option<&str>, now: DateTime<Utc>) -> Result<ApiKey, DomainError> {
        ApiKeyService::issue(self, name, now).await
    }

    async fn authenticate(&self, key: &str, now: DateTime<Utc>) -> Result<ApiKey, DomainError> {
        ApiKeyService::authenticate(self, key, now).await
    }

    async fn regenerate(&self, now: DateTime<Utc>) -> Result<RotatedApiKey, DomainError> {
        ApiKeyService::regenerate(self, now).await
    }

    async fn current(&self) -> Result<Option<ApiKey>, DomainError> {
        ApiKeyService::current(self).await
    }

    async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        ApiKeyService::list(self).await
    }
}

#[async_trait::async_trait]
impl<R: ActivationCodeRepository + 'static> StatisticsServiceTrait for StatisticsService<R> {
    async fn summary(&self, now: DateTime<Utc>) -> Result<CodeStatistics, DomainError> {
        StatisticsService::summary(self, now).await
    }

    async fn daily_series(
        &self,
        now: DateTime<Utc>,
        days: u32,
    ) -> Result<Vec<DailyActivity>, DomainError> {
        StatisticsService::daily_series(self, now, days).await
    }

    async fn dashboard(&self, now: DateTime<Utc>) -> Result<Dashboard, DomainError> {
        StatisticsService::dashboard(self, now).await
    }
}

impl AppState {
    /// Create new application state with provided services
    pub fn new(
        code_service: Arc<dyn CodeServiceTrait>,
        api_key_service: Arc<dyn ApiKeyServiceTrait>,
        statistics_service: Arc<dyn StatisticsServiceTrait>,
    ) -> Self {
        Self {
            code_service,
            api_key_service,
            statistics_service,
            qr_renderer: QrRenderer::new(),
        }
    }

    /// Wire services over a pair of repositories
    pub fn from_repositories<C, K>(codes: Arc<C>, api_keys: Arc<K>) -> Self
    where
        C: ActivationCodeRepository + 'static,
        K: ApiKeyRepository + 'static,
    {
        Self::new(
            Arc::new(ActivationCodeService::new(codes.clone())),
            Arc::new(ApiKeyService::new(api_keys)),
            Arc::new(StatisticsService::new(codes)),
        )
    }
}
