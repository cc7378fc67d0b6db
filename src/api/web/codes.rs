//! Form-driven code generation, redemption, listing and CSV export

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{field, form_fields, FormFields};
use crate::api::state::AppState;
use crate::api::types::params::{self, form_expiry, non_blank};
use crate::api::types::{
    redemption_status, ApiError, CodeListResponse, GenerateResponse, Json, ValidateResponse,
};
use crate::domain::activation_code::{normalize_code, ActivationCode, CodeQuery, StatusFilter};
use crate::infrastructure::activation_code::GenerateCodesRequest;
use crate::infrastructure::export::{export_file_name, render_codes_csv};

/// POST /generate
pub async fn generate_codes(
    State(state): State<AppState>,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let fields = form_fields(form);
    let now = Utc::now();
    let request = generate_request(&fields, now);

    debug!(count = request.count, prefix = ?request.prefix, "Generating codes from form");

    let codes = state.code_service.generate(request, now).await?;
    let mut response = GenerateResponse::new(code_strings(&codes)).with_message();

    if field(&fields, "generate_qr") == Some("on") {
        let mut qr_codes = BTreeMap::new();
        for code in &codes {
            let image = state.qr_renderer.render_base64(&code.code)?;
            qr_codes.insert(code.code.clone(), image);
        }
        response = response.with_qr_codes(qr_codes);
    }

    Ok(Json(response))
}

fn generate_request(fields: &FormFields, now: DateTime<Utc>) -> GenerateCodesRequest {
    GenerateCodesRequest {
        count: params::COUNT.parse_text(field(fields, "count")) as u32,
        prefix: non_blank(field(fields, "prefix")),
        name: non_blank(field(fields, "name")),
        uses_allowed: params::USES_ALLOWED.parse_text(field(fields, "uses_allowed")) as u32,
        expires_at: form_expiry(now, field(fields, "expires_days")),
    }
}

pub(crate) fn code_strings(codes: &[ActivationCode]) -> Vec<String> {
    codes.iter().map(|c| c.code.clone()).collect()
}

/// POST /validate
pub async fn validate_code(
    State(state): State<AppState>,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<(StatusCode, Json<ValidateResponse>), ApiError> {
    let fields = form_fields(form);

    redeem(
        &state,
        field(&fields, "code").unwrap_or_default(),
        field(&fields, "user_name"),
    )
    .await
}

/// Redeem a code and shape the outcome into a status and body
pub(crate) async fn redeem(
    state: &AppState,
    raw_code: &str,
    user_name: Option<&str>,
) -> Result<(StatusCode, Json<ValidateResponse>), ApiError> {
    let now = Utc::now();
    let outcome = state.code_service.redeem(raw_code, user_name, now).await?;
    let status = redemption_status(&outcome);

    Ok((
        status,
        Json(ValidateResponse::from_redemption(
            normalize_code(raw_code),
            outcome,
            now,
        )),
    ))
}

/// GET /codes
pub async fn list_codes(
    State(state): State<AppState>,
    Query(params): Query<FormFields>,
) -> Result<Json<CodeListResponse>, ApiError> {
    let status = StatusFilter::from_param(field(&params, "status"));
    let query = CodeQuery::new()
        .with_status(status)
        .with_search(non_blank(field(&params, "search")))
        .with_page(params::PAGE.parse_text(field(&params, "page")) as u32);

    debug!(page = query.page(), status = status.as_str(), "Listing codes");

    let search = query.search.clone();
    let page = state.code_service.list(&query).await?;

    Ok(Json(CodeListResponse::new(
        page,
        status.as_str(),
        search,
        Utc::now(),
    )))
}

/// GET /export-codes
pub async fn export_codes(
    State(state): State<AppState>,
    Query(params): Query<FormFields>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let status = StatusFilter::from_param(field(&params, "status"));
    let codes = state.code_service.export(status).await?;
    let body = render_codes_csv(&codes, now)?;

    info!(status = status.as_str(), rows = codes.len(), "Exported activation codes");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export_file_name(now)),
            ),
        ],
        body,
    ))
}
