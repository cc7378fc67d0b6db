//! Health, liveness and readiness probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;
use crate::domain::{CodeQuery, DomainError};

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// GET /ready
///
/// Probes both stores. A failing code store makes the service unhealthy;
/// a failing key store only degrades it.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let mut checks = Vec::new();
    let mut overall_status = HealthStatus::Healthy;

    let code_check = check_code_store(&state).await;

    if code_check.status != HealthStatus::Healthy {
        overall_status = HealthStatus::Unhealthy;
    }
    checks.push(code_check);

    let api_key_check = check_api_key_store(&state).await;

    if api_key_check.status != HealthStatus::Healthy && overall_status == HealthStatus::Healthy {
        overall_status = HealthStatus::Degraded;
    }
    checks.push(api_key_check);

    let latency = start.elapsed().as_millis() as u64;
    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(latency),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// GET /live
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn check_code_store(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let result = state.code_service.list(&CodeQuery::new()).await;

    component_check("code_store", start, result.err())
}

async fn check_api_key_store(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let result = state.api_key_service.list().await;

    component_check("api_key_store", start, result.err())
}

fn component_check(name: &str, start: Instant, error: Option<DomainError>) -> HealthCheck {
    let latency_ms = Some(start.elapsed().as_millis() as u64);

    match error {
        None => HealthCheck {
            name: name.to_string(),
            status: HealthStatus::Healthy,
            message: None,
            latency_ms,
        },
        Some(e) => HealthCheck {
            name: name.to_string(),
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
            latency_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn test_health_response_omits_checks() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.1.0".to_string(),
            checks: None,
            latency_ms: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(!json.contains("checks"));
    }

    #[test]
    fn test_component_check() {
        let healthy = component_check("code_store", Instant::now(), None);
        assert_eq!(healthy.status, HealthStatus::Healthy);
        assert!(healthy.message.is_none());

        let failed = component_check(
            "code_store",
            Instant::now(),
            Some(DomainError::storage("connection refused")),
        );
        assert_eq!(failed.status, HealthStatus::Unhealthy);
        assert!(failed.message.unwrap().contains("connection refused"));
    }
}
