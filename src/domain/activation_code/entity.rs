//! Activation code entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::StatusFilter;
use super::validity::{ExportStatus, Validity};

/// Store-assigned activation code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeId(i64);

impl CodeId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for CodeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize a user-supplied code for lookup: trimmed and uppercased
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A code about to be inserted; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivationCode {
    pub code: String,
    pub name: Option<String>,
    pub uses_allowed: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NewActivationCode {
    pub fn new(code: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            code: normalize_code(&code.into()),
            name: None,
            uses_allowed: 1,
            expires_at: None,
            created_at,
        }
    }

    /// Set the label; blank labels are stored as absent
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }

    pub fn with_uses_allowed(mut self, uses_allowed: u32) -> Self {
        self.uses_allowed = uses_allowed.max(1);
        self
    }

    pub fn with_expiration(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Materialize the stored record under the given id
    pub fn into_code(self, id: CodeId) -> ActivationCode {
        ActivationCode {
            id,
            code: self.code,
            name: self.name,
            is_used: false,
            is_active: true,
            uses_allowed: self.uses_allowed,
            uses_count: 0,
            expires_at: self.expires_at,
            created_at: self.created_at,
            used_at: None,
            used_by: None,
        }
    }
}

/// A persisted activation code
///
/// `uses_count` never exceeds `uses_allowed`, and `is_used` holds exactly
/// when the uses are exhausted. Validity is derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationCode {
    pub id: CodeId,
    pub code: String,
    pub name: Option<String>,
    pub is_used: bool,
    pub is_active: bool,
    pub uses_allowed: u32,
    pub uses_count: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<String>,
}

impl ActivationCode {
    /// Evaluate eligibility for redemption at `now`.
    ///
    /// Deactivation wins over exhaustion, which wins over expiry.
    pub fn check_validity(&self, now: DateTime<Utc>) -> Validity {
        if !self.is_active {
            return Validity::Deactivated;
        }

        if self.uses_count >= self.uses_allowed {
            return Validity::Exhausted;
        }

        if let Some(expires_at) = self.expires_at {
            if now > expires_at {
                return Validity::Expired;
            }
        }

        Validity::Valid
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.check_validity(now).is_valid()
    }

    pub fn uses_remaining(&self) -> u32 {
        self.uses_allowed.saturating_sub(self.uses_count)
    }

    /// Status column used by the CSV export
    pub fn export_status(&self, now: DateTime<Utc>) -> ExportStatus {
        if self.is_valid_at(now) {
            ExportStatus::Valid
        } else if self.is_used {
            ExportStatus::Used
        } else {
            ExportStatus::Inactive
        }
    }

    /// Consume one use. Leaves the record untouched when it is not valid.
    pub fn redeem(
        &mut self,
        now: DateTime<Utc>,
        redeemed_by: Option<&str>,
    ) -> Result<(), Validity> {
        let validity = self.check_validity(now);

        if !validity.is_valid() {
            return Err(validity);
        }

        self.uses_count += 1;

        if self.uses_count >= self.uses_allowed {
            self.is_used = true;
        }

        self.used_at = Some(now);

        if let Some(label) = redeemed_by.map(str::trim).filter(|l| !l.is_empty()) {
            self.used_by = Some(label.to_string());
        }

        Ok(())
    }

    /// Flip the manual enable flag, returning the new value
    pub fn toggle_active(&mut self) -> bool {
        self.is_active = !self.is_active;
        self.is_active
    }

    pub fn matches_status(&self, filter: StatusFilter) -> bool {
        match filter {
            StatusFilter::All => true,
            StatusFilter::Valid => self.is_active && !self.is_used,
            StatusFilter::Used => self.is_used,
            StatusFilter::Inactive => !self.is_active,
        }
    }

    /// Case-insensitive substring match over code, name and redeemer
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();

        if needle.is_empty() {
            return true;
        }

        [Some(&self.code), self.name.as_ref(), self.used_by.as_ref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}
