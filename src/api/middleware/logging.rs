//! Request/response logging middleware with sensitive data redaction

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

static API_KEY_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|&)(api_key)=[^&]*").unwrap());

/// Middleware to log HTTP requests and responses with sensitive data redaction.
/// Runs inside the `TraceLayer` span and does not open one of its own.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = extract_path(&request);
    let query = request.uri().query().map(redact_query).unwrap_or_default();
    let request_id = extract_request_id(&request);
    let headers_log = redact_headers(&request);

    info!(
        method = %method,
        path = %path,
        query = %query,
        request_id = %request_id,
        headers = %headers_log,
        "Incoming request"
    );

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

fn extract_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

fn extract_request_id(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Redact the `api_key` query parameter
pub fn redact_query(query: &str) -> String {
    API_KEY_QUERY
        .replace_all(query, "${1}${2}=[REDACTED]")
        .into_owned()
}

fn redact_headers(request: &Request<Body>) -> String {
    let mut parts = Vec::new();

    for (name, value) in request.headers() {
        let name_str = name.as_str().to_lowercase();

        if !should_log_header(&name_str) {
            continue;
        }

        let value_str = if is_sensitive_header(&name_str) {
            "[REDACTED]"
        } else {
            value.to_str().unwrap_or("[invalid]")
        };

        parts.push(format!("{}={}", name_str, value_str));
    }

    parts.join(", ")
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "authorization" | "x-api-key" | "cookie" | "set-cookie" | "proxy-authorization"
    )
}

fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "content-length"
            | "accept"
            | "user-agent"
            | "x-request-id"
            | "x-forwarded-for"
            | "x-real-ip"
            | "authorization"
            | "x-api-key"
    )
}
