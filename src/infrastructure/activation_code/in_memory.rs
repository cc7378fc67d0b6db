//! In-memory activation code repository

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::activation_code::{
    normalize_code, ActivationCode, ActivationCodeRepository, CodeId, CodeQuery,
    NewActivationCode, Page, Redemption, StatusFilter, TimeWindow,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct CodeTable {
    next_id: i64,
    rows: BTreeMap<CodeId, ActivationCode>,
    by_code: HashMap<String, CodeId>,
}

impl CodeTable {
    /// Rows ordered newest first, ties broken by id
    fn newest_first<'a>(
        &'a self,
        predicate: impl Fn(&ActivationCode) -> bool + 'a,
    ) -> impl Iterator<Item = &'a ActivationCode> + 'a {
        let mut rows: Vec<&ActivationCode> = self.rows.values().filter(|c| predicate(c)).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.into_iter()
    }
}

/// Thread-safe in-memory implementation of ActivationCodeRepository
///
/// Every mutation holds the write lock across its read-modify-write, so
/// redemptions of the same code are serialized.
#[derive(Debug, Default)]
pub struct InMemoryActivationCodeRepository {
    table: RwLock<CodeTable>,
}

impl InMemoryActivationCodeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivationCodeRepository for InMemoryActivationCodeRepository {
    async fn insert(&self, code: NewActivationCode) -> Result<ActivationCode, DomainError> {
        let mut table = self.table.write().await;

        if table.by_code.contains_key(&code.code) {
            return Err(DomainError::conflict(format!(
                "Activation code '{}' already exists",
                code.code
            )));
        }

        table.next_id += 1;
        let id = CodeId::new(table.next_id);
        let stored = code.into_code(id);

        table.by_code.insert(stored.code.clone(), id);
        table.rows.insert(id, stored.clone());

        Ok(stored)
    }

    async fn get(&self, id: CodeId) -> Result<Option<ActivationCode>, DomainError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ActivationCode>, DomainError> {
        let table = self.table.read().await;

        Ok(table
            .by_code
            .get(&normalize_code(code))
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn delete(&self, id: CodeId) -> Result<bool, DomainError> {
        let mut table = self.table.write().await;

        match table.rows.remove(&id) {
            Some(removed) => {
                table.by_code.remove(&removed.code);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn toggle_active(&self, id: CodeId) -> Result<Option<ActivationCode>, DomainError> {
        let mut table = self.table.write().await;

        Ok(table.rows.get_mut(&id).map(|code| {
            code.toggle_active();
            code.clone()
        }))
    }

    async fn redeem(
        &self,
        code: &str,
        now: DateTime<Utc>,
        redeemed_by: Option<String>,
    ) -> Result<Redemption, DomainError> {
        let mut table = self.table.write().await;

        let Some(id) = table.by_code.get(&normalize_code(code)).copied() else {
            return Ok(Redemption::NotFound);
        };

        let Some(record) = table.rows.get_mut(&id) else {
            return Ok(Redemption::NotFound);
        };

        match record.redeem(now, redeemed_by.as_deref()) {
            Ok(()) => Ok(Redemption::Redeemed(record.clone())),
            Err(reason) => Ok(Redemption::Rejected {
                code: record.clone(),
                reason,
            }),
        }
    }

    async fn list(&self, query: &CodeQuery) -> Result<Page<ActivationCode>, DomainError> {
        let table = self.table.read().await;
        let status = query.status;
        let search = query.search.clone().unwrap_or_default();

        let matching: Vec<&ActivationCode> = table
            .newest_first(move |c| c.matches_status(status) && c.matches_search(&search))
            .collect();

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page() as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, query.page(), query.per_page(), total))
    }

    async fn list_all(&self, status: StatusFilter) -> Result<Vec<ActivationCode>, DomainError> {
        let table = self.table.read().await;
        Ok(table
            .newest_first(move |c| c.matches_status(status))
            .cloned()
            .collect())
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<ActivationCode>, DomainError> {
        let term = term.trim().to_string();

        if term.is_empty() {
            return Ok(Vec::new());
        }

        let table = self.table.read().await;
        Ok(table
            .newest_first(move |c| c.matches_search(&term))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<ActivationCode>, DomainError> {
        let table = self.table.read().await;
        Ok(table
            .newest_first(|_| true)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn recently_redeemed(&self, limit: u32) -> Result<Vec<ActivationCode>, DomainError> {
        let table = self.table.read().await;
        let mut redeemed: Vec<&ActivationCode> =
            table.rows.values().filter(|c| c.used_at.is_some()).collect();
        redeemed.sort_by(|a, b| b.used_at.cmp(&a.used_at).then(b.id.cmp(&a.id)));

        Ok(redeemed.into_iter().take(limit as usize).cloned().collect())
    }

    async fn count(&self, status: StatusFilter) -> Result<u64, DomainError> {
        let table = self.table.read().await;
        Ok(table.rows.values().filter(|c| c.matches_status(status)).count() as u64)
    }

    async fn count_created_between(&self, window: TimeWindow) -> Result<u64, DomainError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|c| window.contains(c.created_at))
            .count() as u64)
    }

    async fn count_used_between(&self, window: TimeWindow) -> Result<u64, DomainError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|c| c.used_at.is_some_and(|at| window.contains(at)))
            .count() as u64)
    }
}
