//! API key management from the docs view

use axum::extract::{rejection::FormRejection, Form, State};
use chrono::Utc;

use super::{field, form_fields, FormFields};
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiKeyResponse, Json};

/// GET /api-key
pub async fn get_api_key(State(state): State<AppState>) -> Result<Json<ApiKeyResponse>, ApiError> {
    let api_key = state.api_key_service.current().await?;

    let message = if api_key.is_some() {
        "Active API key"
    } else {
        "No active API key"
    };

    Ok(Json(ApiKeyResponse {
        success: true,
        message,
        api_key,
    }))
}

/// POST /generate-api-key
pub async fn generate_api_key(
    State(state): State<AppState>,
    form: Result<Form<FormFields>, FormRejection>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let fields = form_fields(form);

    let api_key = state
        .api_key_service
        .issue(field(&fields, "name"), Utc::now())
        .await?;

    Ok(Json(ApiKeyResponse {
        success: true,
        message: "API key generated successfully",
        api_key: Some(api_key),
    }))
}

/// POST /regenerate-api-key
pub async fn regenerate_api_key(
    State(state): State<AppState>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let rotated = state.api_key_service.regenerate(Utc::now()).await?;

    Ok(Json(ApiKeyResponse {
        success: true,
        message: "API key regenerated successfully",
        api_key: Some(rotated.current),
    }))
}
