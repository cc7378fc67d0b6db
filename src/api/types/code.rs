//! Response payloads for activation code endpoints

use std::collections::BTreeMap;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::activation_code::{ActivationCode, Page, Redemption};
use crate::domain::statistics::{CodeStatistics, DailyActivity};
use crate::domain::ApiKey;
use crate::infrastructure::statistics::Dashboard;

pub const ACTIVATED_MESSAGE: &str = "Code activated successfully!";
pub const NOT_FOUND_MESSAGE: &str = "Code not found";

/// An activation code with its validity evaluated at response time
#[derive(Debug, Clone, Serialize)]
pub struct CodeResponse {
    pub id: i64,
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
    /// `valid` or `invalid`
    pub status: &'static str,
    pub status_message: &'static str,
}

impl CodeResponse {
    pub fn new(code: ActivationCode, now: DateTime<Utc>) -> Self {
        let validity = code.check_validity(now);

        Self {
            id: code.id.value(),
            code: code.code,
            name: code.name,
            is_used: code.is_used,
            is_active: code.is_active,
            uses_allowed: code.uses_allowed,
            uses_count: code.uses_count,
            expires_at: code.expires_at,
            created_at: code.created_at,
            used_at: code.used_at,
            used_by: code.used_by,
            status: if validity.is_valid() { "valid" } else { "invalid" },
            status_message: validity.message(),
        }
    }

    pub fn list(codes: Vec<ActivationCode>, now: DateTime<Utc>) -> Vec<Self> {
        codes.into_iter().map(|c| Self::new(c, now)).collect()
    }
}

/// Result of a batch generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub count: usize,
    pub codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Code to base64 PNG
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_codes: Option<BTreeMap<String, String>>,
}

impl GenerateResponse {
    pub fn new(codes: Vec<String>) -> Self {
        Self {
            success: true,
            count: codes.len(),
            codes,
            message: None,
            qr_codes: None,
        }
    }

    pub fn with_message(mut self) -> Self {
        self.message = Some(format!(
            "Successfully generated {} activation code(s)!",
            self.count
        ));
        self
    }

    pub fn with_qr_codes(mut self, qr_codes: BTreeMap<String, String>) -> Self {
        self.qr_codes = Some(qr_codes);
        self
    }
}

/// Result of a redemption attempt
#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CodeResponse>,
}

impl ValidateResponse {
    /// Body for a redemption outcome on the normalized `code`
    pub fn from_redemption(code: String, outcome: Redemption, now: DateTime<Utc>) -> Self {
        match outcome {
            Redemption::Redeemed(stored) => Self {
                valid: true,
                message: ACTIVATED_MESSAGE.to_string(),
                code,
                data: Some(CodeResponse::new(stored, now)),
            },
            Redemption::Rejected { reason, .. } => Self {
                valid: false,
                message: reason.message().to_string(),
                code,
                data: None,
            },
            Redemption::NotFound => Self {
                valid: false,
                message: NOT_FOUND_MESSAGE.to_string(),
                code,
                data: None,
            },
        }
    }
}

/// HTTP status for a redemption outcome: 200, 400 when rejected, 404 when unknown
pub fn redemption_status(outcome: &Redemption) -> StatusCode {
    match outcome {
        Redemption::Redeemed(_) => StatusCode::OK,
        Redemption::Rejected { .. } => StatusCode::BAD_REQUEST,
        Redemption::NotFound => StatusCode::NOT_FOUND,
    }
}

/// Non-consuming status check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl CheckResponse {
    pub fn found(code: &ActivationCode, now: DateTime<Utc>) -> Self {
        let validity = code.check_validity(now);

        Self {
            found: true,
            valid: Some(validity.is_valid()),
            message: validity.message().to_string(),
            uses_remaining: Some(code.uses_remaining()),
            expires_at: Some(code.expires_at),
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            valid: None,
            message: NOT_FOUND_MESSAGE.to_string(),
            uses_remaining: None,
            expires_at: None,
        }
    }
}

/// One page of the code listing
#[derive(Debug, Clone, Serialize)]
pub struct CodeListResponse {
    pub codes: Vec<CodeResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u64,
    pub has_prev: bool,
    pub has_next: bool,
    pub filter_status: &'static str,
    pub search: String,
}

impl CodeListResponse {
    pub fn new(
        page: Page<ActivationCode>,
        filter_status: &'static str,
        search: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let pages = page.pages();
        let has_prev = page.has_prev();
        let has_next = page.has_next();
        let page = page.map(|c| CodeResponse::new(c, now));

        Self {
            codes: page.items,
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            pages,
            has_prev,
            has_next,
            filter_status,
            search: search.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub codes: Vec<CodeResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Dashboard and statistics views
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub stats: CodeStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<Vec<DailyActivity>>,
    pub recent_codes: Vec<CodeResponse>,
    pub recent_activations: Vec<CodeResponse>,
}

impl DashboardResponse {
    pub fn new(
        dashboard: Dashboard,
        daily: Option<Vec<DailyActivity>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            stats: dashboard.stats,
            daily,
            recent_codes: CodeResponse::list(dashboard.recent_codes, now),
            recent_activations: CodeResponse::list(dashboard.recent_activations, now),
        }
    }
}

/// API key as shown on the docs view
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyResponse {
    pub success: bool,
    pub message: &'static str,
    pub api_key: Option<ApiKey>,
}
