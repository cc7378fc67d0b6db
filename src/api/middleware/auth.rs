//! API key authentication extractor

use axum::{
    extract::{FromRequestParts, Query},
    http::{request::Parts, HeaderMap, Uri},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::api_key::ApiKey;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Extractor that requires a valid API key
///
/// Reads the key from the `X-API-Key` header, falling back to the
/// `api_key` query parameter. Each accepted request is counted against
/// the key.
#[derive(Debug, Clone)]
pub struct RequireApiKey(pub ApiKey);

#[derive(Debug, Deserialize)]
struct ApiKeyQuery {
    api_key: Option<String>,
}

impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = extract_api_key(&parts.headers, &parts.uri)
            .ok_or_else(|| ApiError::unauthorized("API key required"))?;

        debug!(
            key_prefix = %presented.chars().take(8).collect::<String>(),
            "Validating API key"
        );

        let api_key = state
            .api_key_service
            .authenticate(&presented, Utc::now())
            .await?;

        Ok(RequireApiKey(api_key))
    }
}

fn extract_api_key(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty());

    if let Some(key) = from_header {
        return Some(key.to_string());
    }

    Query::<ApiKeyQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(params)| params.api_key)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(query: Option<&str>) -> Uri {
        match query {
            Some(q) => format!("/api/generate?{}", q).parse().unwrap(),
            None => Uri::from_static("/api/generate"),
        }
    }

    #[test]
    fn test_extract_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "cvk_header".parse().unwrap());

        assert_eq!(extract_api_key(&headers, &uri(None)).as_deref(), Some("cvk_header"));
    }

    #[test]
    fn test_header_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "cvk_header".parse().unwrap());

        let key = extract_api_key(&headers, &uri(Some("api_key=cvk_query")));
        assert_eq!(key.as_deref(), Some("cvk_header"));
    }

    #[test]
    fn test_extract_from_query() {
        let headers = HeaderMap::new();

        let key = extract_api_key(&headers, &uri(Some("count=2&api_key=cvk_query")));
        assert_eq!(key.as_deref(), Some("cvk_query"));
    }

    #[test]
    fn test_blank_header_falls_back_to_query() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "   ".parse().unwrap());

        let key = extract_api_key(&headers, &uri(Some("api_key=cvk_query")));
        assert_eq!(key.as_deref(), Some("cvk_query"));
    }

    #[test]
    fn test_missing_api_key() {
        let headers = HeaderMap::new();

        assert!(extract_api_key(&headers, &uri(None)).is_none());
        assert!(extract_api_key(&headers, &uri(Some("api_key="))).is_none());
        assert!(extract_api_key(&headers, &uri(Some("other=1"))).is_none());
    }
}
