//! JSON code endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::params::{self, expiry_after_days, json_text, non_blank};
use crate::api::types::{
    ApiError, CheckResponse, CodeResponse, GenerateResponse, Json, SearchResponse,
    SuccessResponse, ToggleResponse, ValidateResponse,
};
use crate::api::web::codes::{code_strings, redeem};
use crate::api::web::{field, FormFields};
use crate::domain::activation_code::CodeId;
use crate::domain::statistics::CodeStatistics;
use crate::infrastructure::activation_code::GenerateCodesRequest;

/// POST /api/generate
///
/// The body is read leniently: anything that is not a JSON object is
/// treated as `{}`.
pub async fn generate_codes(
    State(state): State<AppState>,
    RequireApiKey(api_key): RequireApiKey,
    body: Bytes,
) -> Result<Json<GenerateResponse>, ApiError> {
    let payload = lenient_object(&body);
    let now = Utc::now();
    let request = generate_request(&payload, now);

    info!(
        key_id = %api_key.id,
        count = request.count,
        "Generating codes via API"
    );

    let codes = state.code_service.generate(request, now).await?;

    Ok(Json(GenerateResponse::new(code_strings(&codes))))
}

fn lenient_object(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn generate_request(payload: &Map<String, Value>, now: DateTime<Utc>) -> GenerateCodesRequest {
    let expires_days = params::EXPIRES_DAYS.parse_json(payload.get("expires_days"));

    GenerateCodesRequest {
        count: params::COUNT.parse_json(payload.get("count")) as u32,
        prefix: non_blank(Some(&json_text(payload, "prefix"))),
        name: non_blank(Some(&json_text(payload, "name"))),
        uses_allowed: params::USES_ALLOWED.parse_json(payload.get("uses_allowed")) as u32,
        expires_at: expiry_after_days(now, expires_days),
    }
}

/// POST /api/validate
pub async fn validate_code(
    State(state): State<AppState>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<ValidateResponse>), ApiError> {
    let code = json_text(&payload, "code");

    if code.is_empty() {
        return Err(ApiError::bad_request("Code is required"));
    }

    let user_name = non_blank(Some(&json_text(&payload, "user_name")));

    redeem(&state, &code, user_name.as_deref()).await
}

/// POST /api/code/{id}/toggle
pub async fn toggle_code(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let code = state.code_service.toggle(parse_code_id(&id)?).await?;

    Ok(Json(ToggleResponse {
        success: true,
        is_active: code.is_active,
    }))
}

/// POST /api/code/{id}/delete
pub async fn delete_code(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.code_service.delete(parse_code_id(&id)?).await?;

    Ok(Json(SuccessResponse { success: true }))
}

fn parse_code_id(raw: &str) -> Result<CodeId, ApiError> {
    raw.parse::<i64>()
        .map(CodeId::new)
        .map_err(|_| ApiError::not_found(format!("Activation code {} not found", raw)))
}

/// GET /api/code/{code}/check
pub async fn check_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<CheckResponse>), ApiError> {
    debug!(code = %code, "Checking code");

    match state.code_service.check(&code).await? {
        Some(stored) => Ok((
            StatusCode::OK,
            Json(CheckResponse::found(&stored, Utc::now())),
        )),
        None => Ok((StatusCode::NOT_FOUND, Json(CheckResponse::not_found()))),
    }
}

/// GET /api/codes/search?q=&limit=
pub async fn search_codes(
    State(state): State<AppState>,
    Query(params): Query<FormFields>,
) -> Result<Json<SearchResponse>, ApiError> {
    let term = field(&params, "q").unwrap_or_default();
    let limit = params::SEARCH_LIMIT.parse_text(field(&params, "limit")) as u32;

    let codes = state.code_service.search(term, Some(limit)).await?;

    Ok(Json(SearchResponse {
        codes: CodeResponse::list(codes, Utc::now()),
    }))
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<CodeStatistics>, ApiError> {
    let stats = state.statistics_service.summary(Utc::now()).await?;

    Ok(Json(stats))
}
