//! Activation code service - generation, redemption and code management

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::activation_code::{
    normalize_code, ActivationCode, ActivationCodeRepository, CodeId, CodeQuery,
    NewActivationCode, Page, Redemption, StatusFilter, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT,
};
use crate::domain::DomainError;

use super::generator::CodeGenerator;

/// Attempts at finding an unused code string before giving up on a unit
pub const MAX_GENERATION_ATTEMPTS: usize = 10;

/// Request to generate a batch of codes
#[derive(Debug, Clone)]
pub struct GenerateCodesRequest {
    pub count: u32,
    pub prefix: Option<String>,
    pub name: Option<String>,
    pub uses_allowed: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Default for GenerateCodesRequest {
    fn default() -> Self {
        Self {
            count: 1,
            prefix: None,
            name: None,
            uses_allowed: 1,
            expires_at: None,
        }
    }
}

/// Activation code service over a code repository
#[derive(Debug)]
pub struct ActivationCodeService<R: ActivationCodeRepository> {
    repository: Arc<R>,
    generator: CodeGenerator,
}

impl<R: ActivationCodeRepository> ActivationCodeService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            generator: CodeGenerator::new(),
        }
    }

    /// Generate up to `request.count` new codes.
    ///
    /// A unit whose candidates collide [`MAX_GENERATION_ATTEMPTS`] times is
    /// skipped, so the result may be shorter than requested.
    pub async fn generate(
        &self,
        request: GenerateCodesRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActivationCode>, DomainError> {
        let mut generated = Vec::with_capacity(request.count as usize);

        for _ in 0..request.count {
            match self.generate_one(&request, now).await? {
                Some(code) => generated.push(code),
                None => warn!(
                    attempts = MAX_GENERATION_ATTEMPTS,
                    "Skipping code: no unused code string found"
                ),
            }
        }

        info!(
            requested = request.count,
            generated = generated.len(),
            "Generated activation codes"
        );

        Ok(generated)
    }

    async fn generate_one(
        &self,
        request: &GenerateCodesRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<ActivationCode>, DomainError> {
        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let candidate = self.generator.generate(request.prefix.as_deref());

            if self.repository.find_by_code(&candidate).await?.is_some() {
                debug!(code = %candidate, "Generated code already exists");
                continue;
            }

            let new_code = NewActivationCode::new(candidate, now)
                .with_name(request.name.clone())
                .with_uses_allowed(request.uses_allowed)
                .with_expiration(request.expires_at);

            match self.repository.insert(new_code).await {
                Ok(stored) => return Ok(Some(stored)),
                Err(e) if e.is_conflict() => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    /// Consume one use of a code
    pub async fn redeem(
        &self,
        code: &str,
        user_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Redemption, DomainError> {
        let code = normalize_code(code);

        if code.is_empty() {
            return Ok(Redemption::NotFound);
        }

        let redeemed_by = user_name
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string);

        let outcome = self.repository.redeem(&code, now, redeemed_by).await?;

        match &outcome {
            Redemption::Redeemed(stored) => info!(
                code = %stored.code,
                uses_count = stored.uses_count,
                uses_allowed = stored.uses_allowed,
                "Code redeemed"
            ),
            Redemption::Rejected { reason, .. } => {
                debug!(code = %code, reason = %reason, "Redemption rejected")
            }
            Redemption::NotFound => debug!(code = %code, "Redemption of unknown code"),
        }

        Ok(outcome)
    }

    /// Look up a code without consuming it
    pub async fn check(&self, code: &str) -> Result<Option<ActivationCode>, DomainError> {
        let code = normalize_code(code);

        if code.is_empty() {
            return Ok(None);
        }

        self.repository.find_by_code(&code).await
    }

    /// Flip the active flag, returning the updated code
    pub async fn toggle(&self, id: CodeId) -> Result<ActivationCode, DomainError> {
        let code = self
            .repository
            .toggle_active(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Activation code {} not found", id)))?;

        info!(id = %id, is_active = code.is_active, "Toggled activation code");
        Ok(code)
    }

    pub async fn delete(&self, id: CodeId) -> Result<(), DomainError> {
        if !self.repository.delete(id).await? {
            return Err(DomainError::not_found(format!(
                "Activation code {} not found",
                id
            )));
        }

        info!(id = %id, "Deleted activation code");
        Ok(())
    }

    pub async fn list(&self, query: &CodeQuery) -> Result<Page<ActivationCode>, DomainError> {
        self.repository.list(query).await
    }

    /// Bounded search; a blank term matches nothing
    pub async fn search(
        &self,
        term: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ActivationCode>, DomainError> {
        let term = term.trim();

        if term.is_empty() {
            return Ok(Vec::new());
        }

        let limit = limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);

        self.repository.search(term, limit).await
    }

    /// All codes matching the filter, newest first
    pub async fn export(&self, status: StatusFilter) -> Result<Vec<ActivationCode>, DomainError> {
        self.repository.list_all(status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::domain::activation_code::MockActivationCodeRepository;
    use crate::domain::Validity;
    use crate::infrastructure::activation_code::InMemoryActivationCodeRepository;

    fn create_service() -> ActivationCodeService<InMemoryActivationCodeRepository> {
        ActivationCodeService::new(Arc::new(InMemoryActivationCodeRepository::new()))
    }

    fn request(count: u32) -> GenerateCodesRequest {
        GenerateCodesRequest {
            count,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generate_batch() {
        let service = create_service();
        let codes = service.generate(request(5), Utc::now()).await.unwrap();

        assert_eq!(codes.len(), 5);
        assert!(codes.iter().all(|c| c.is_active && !c.is_used));
    }

    #[tokio::test]
    async fn test_prefix_round_trip() {
        let service = create_service();
        let now = Utc::now();
        let generate = GenerateCodesRequest {
            prefix: Some("promo".into()),
            name: Some("Launch".into()),
            ..request(1)
        };

        let codes = service.generate(generate, now).await.unwrap();
        let code = &codes[0].code;
        assert!(code.starts_with("PROMO-"));

        let outcome = service.redeem(code, Some("alice"), now).await.unwrap();
        match outcome {
            Redemption::Redeemed(stored) => {
                assert!(stored.is_used);
                assert_eq!(stored.used_by.as_deref(), Some("alice"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let again = service.redeem(code, None, now).await.unwrap();
        assert!(matches!(
            again,
            Redemption::Rejected { reason: Validity::Exhausted, .. }
        ));
    }

    #[tokio::test]
    async fn test_multi_use_code() {
        let service = create_service();
        let now = Utc::now();
        let codes = service
            .generate(GenerateCodesRequest { uses_allowed: 3, ..request(1) }, now)
            .await
            .unwrap();
        let code = codes[0].code.clone();

        for expected in 1..=3u32 {
            match service.redeem(&code, None, now).await.unwrap() {
                Redemption::Redeemed(stored) => {
                    assert_eq!(stored.uses_count, expected);
                    assert_eq!(stored.is_used, expected == 3);
                }
                other => panic!("unexpected outcome: {:?}", other),
            }
        }

        match service.redeem(&code, None, now).await.unwrap() {
            Redemption::Rejected { code, reason } => {
                assert_eq!(reason, Validity::Exhausted);
                assert_eq!(code.uses_count, 3);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected() {
        let service = create_service();
        let created = Utc::now() - Duration::days(2);
        let generate = GenerateCodesRequest {
            uses_allowed: 5,
            expires_at: Some(created + Duration::days(1)),
            ..request(1)
        };
        let codes = service.generate(generate, created).await.unwrap();

        let outcome = service.redeem(&codes[0].code, None, Utc::now()).await.unwrap();
        assert!(matches!(
            outcome,
            Redemption::Rejected { reason: Validity::Expired, .. }
        ));
    }

    #[tokio::test]
    async fn test_toggle_controls_validity() {
        let service = create_service();
        let now = Utc::now();
        let codes = service.generate(request(1), now).await.unwrap();
        let id = codes[0].id;

        let disabled = service.toggle(id).await.unwrap();
        assert!(!disabled.is_active);
        assert!(matches!(
            service.redeem(&disabled.code, None, now).await.unwrap(),
            Redemption::Rejected { reason: Validity::Deactivated, .. }
        ));

        let enabled = service.toggle(id).await.unwrap();
        assert!(enabled.is_active);
        assert!(service
            .redeem(&enabled.code, None, now)
            .await
            .unwrap()
            .is_redeemed());
    }

    #[tokio::test]
    async fn test_toggle_and_delete_unknown_id() {
        let service = create_service();

        let toggled = service.toggle(CodeId::new(42)).await;
        assert!(matches!(toggled, Err(DomainError::NotFound { .. })));

        let deleted = service.delete(CodeId::new(42)).await;
        assert!(matches!(deleted, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_empty_code_is_not_found() {
        let service = create_service();

        let outcome = service.redeem("   ", None, Utc::now()).await.unwrap();
        assert_eq!(outcome, Redemption::NotFound);
        assert!(service.check("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_bounds() {
        let service = create_service();
        let generate = GenerateCodesRequest {
            name: Some("Winter Sale".into()),
            ..request(3)
        };
        service.generate(generate, Utc::now()).await.unwrap();

        assert_eq!(service.search("winter", None).await.unwrap().len(), 3);
        assert_eq!(service.search("winter", Some(0)).await.unwrap().len(), 1);
        assert!(service.search("", Some(50)).await.unwrap().is_empty());
        assert!(service.search("autumn", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_collision_exhaustion_skips_unit() {
        let mut repository = MockActivationCodeRepository::new();
        let now = Utc::now();

        repository
            .expect_find_by_code()
            .times(MAX_GENERATION_ATTEMPTS)
            .returning(move |code| {
                Ok(Some(
                    NewActivationCode::new(code, now).into_code(CodeId::new(1)),
                ))
            });
        repository.expect_insert().never();

        let service = ActivationCodeService::new(Arc::new(repository));
        let codes = service.generate(request(1), now).await.unwrap();

        assert!(codes.is_empty());
    }

    #[tokio::test]
    async fn test_insert_conflict_counts_as_collision() {
        let mut repository = MockActivationCodeRepository::new();
        let now = Utc::now();
        let mut inserts = 0;

        repository.expect_find_by_code().returning(|_| Ok(None));
        repository.expect_insert().times(2).returning(move |code| {
            inserts += 1;
            if inserts == 1 {
                Err(DomainError::conflict("duplicate"))
            } else {
                Ok(code.into_code(CodeId::new(7)))
            }
        });

        let service = ActivationCodeService::new(Arc::new(repository));
        let codes = service.generate(request(1), now).await.unwrap();

        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].id, CodeId::new(7));
    }

    #[tokio::test]
    async fn test_storage_error_propagates() {
        let mut repository = MockActivationCodeRepository::new();
        repository
            .expect_find_by_code()
            .returning(|_| Err(DomainError::storage("connection reset")));

        let service = ActivationCodeService::new(Arc::new(repository));
        let result = service.generate(request(3), Utc::now()).await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_single_use_redemption() {
        let service = Arc::new(create_service());
        let now = Utc::now();
        let codes = service.generate(request(1), now).await.unwrap();
        let code = codes[0].code.clone();

        let attempts = (0..16).map(|_| {
            let service = service.clone();
            let code = code.clone();
            tokio::spawn(async move { service.redeem(&code, None, now).await.unwrap() })
        });

        let redeemed = futures::future::join_all(attempts)
            .await
            .into_iter()
            .filter(|outcome| outcome.as_ref().unwrap().is_redeemed())
            .count();

        assert_eq!(redeemed, 1);
    }
}
