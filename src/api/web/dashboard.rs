//! Dashboard and statistics views

use axum::extract::State;
use chrono::Utc;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, DashboardResponse, Json};
use crate::infrastructure::statistics::DASHBOARD_DAYS;

/// GET /
pub async fn index(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let now = Utc::now();
    let dashboard = state.statistics_service.dashboard(now).await?;

    Ok(Json(DashboardResponse::new(dashboard, None, now)))
}

/// GET /statistics
pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    debug!("Building statistics view");

    let now = Utc::now();
    let dashboard = state.statistics_service.dashboard(now).await?;
    let daily = state
        .statistics_service
        .daily_series(now, DASHBOARD_DAYS)
        .await?;

    Ok(Json(DashboardResponse::new(dashboard, Some(daily), now)))
}
