use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::health;
use super::middleware::{logging_middleware, security_headers_middleware};
use super::rest;
use super::state::AppState;
use super::web;

/// Create a minimal router without state
/// Note: /ready endpoint is not available without state
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .layer(TraceLayer::new_for_http())
}

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Forms, listings, dashboard and key management
        .merge(web::create_web_router())
        // JSON API
        .nest("/api", rest::create_rest_router())
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::ActivationCode;
    use crate::infrastructure::activation_code::{
        GenerateCodesRequest, InMemoryActivationCodeRepository,
    };
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;

    fn test_state() -> AppState {
        AppState::from_repositories(
            Arc::new(InMemoryActivationCodeRepository::new()),
            Arc::new(InMemoryApiKeyRepository::new()),
        )
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        create_router_with_state(state.clone())
            .oneshot(request)
            .await
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, form: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn seed(state: &AppState, count: u32, name: Option<&str>) -> Vec<ActivationCode> {
        state
            .code_service
            .generate(
                GenerateCodesRequest {
                    count,
                    name: name.map(str::to_string),
                    ..Default::default()
                },
                Utc::now(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let state = test_state();

        let response = send(&state, get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&state, get("/ready")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["checks"].as_array().unwrap().len(), 2);

        let response = create_router().oneshot(get("/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unauthenticated_generate_is_rejected() {
        let state = test_state();

        let response = send(&state, post_json("/api/generate", r#"{"count": 5}"#)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "API key required");

        let request = Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("x-api-key", "cvk_not_a_real_key")
            .body(Body::from("{}"))
            .unwrap();
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let stats = body_json(send(&state, get("/api/stats")).await).await;
        assert_eq!(stats["total"], 0);
    }

    #[tokio::test]
    async fn test_authenticated_generate() {
        let state = test_state();
        let key = state
            .api_key_service
            .issue(Some("Test"), Utc::now())
            .await
            .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("x-api-key", key.key.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"count": 2, "prefix": "promo", "expires_days": 10}"#))
            .unwrap();
        let response = send(&state, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 2);
        for code in json["codes"].as_array().unwrap() {
            assert!(code.as_str().unwrap().starts_with("PROMO-"));
        }

        let current = state.api_key_service.current().await.unwrap().unwrap();
        assert_eq!(current.request_count, 1);
    }

    #[tokio::test]
    async fn test_generate_with_query_key_and_malformed_body() {
        let state = test_state();
        let key = state.api_key_service.issue(None, Utc::now()).await.unwrap();

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/generate?api_key={}", key.key))
            .body(Body::from("definitely not json"))
            .unwrap();
        let response = send(&state, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["count"], 1);
    }

    #[tokio::test]
    async fn test_promo_round_trip() {
        let state = test_state();

        let response = send(
            &state,
            post_form("/generate", "count=1&prefix=PROMO&uses_allowed=1&generate_qr=on"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Successfully generated 1 activation code(s)!");
        let code = json["codes"][0].as_str().unwrap().to_string();
        assert!(code.starts_with("PROMO-"));
        assert!(json["qr_codes"][&code].is_string());

        let form = format!("code={}&user_name=alice", code.to_lowercase());
        let response = send(&state, post_form("/validate", &form)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["valid"], true);
        assert_eq!(json["message"], "Code activated successfully!");
        assert_eq!(json["code"], code);
        assert_eq!(json["data"]["used_by"], "alice");
        assert_eq!(json["data"]["is_used"], true);

        let response = send(&state, post_form("/validate", &form)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["valid"], false);
        assert_eq!(json["message"], "Code has reached maximum uses");
    }

    #[tokio::test]
    async fn test_validate_unknown_and_missing_codes() {
        let state = test_state();

        let response = send(&state, post_form("/validate", "code=NOPE-NOPE-NOPE")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "Code not found");

        let response = send(&state, post_form("/validate", "user_name=bob")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&state, post_json("/api/validate", r#"{"user_name": "bob"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Code is required");

        let response = send(&state, post_json("/api/validate", "{broken")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_validate_redeems() {
        let state = test_state();
        let code = seed(&state, 1, None).await.remove(0);

        let body = format!(r#"{{"code": "{}"}}"#, code.code);
        let response = send(&state, post_json("/api/validate", &body)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["valid"], true);
        assert_eq!(json["data"]["uses_count"], 1);
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let state = test_state();
        seed(&state, 2, Some("Spring Campaign")).await;
        seed(&state, 1, Some("Other")).await;

        let json = body_json(send(&state, get("/api/codes/search?q=spring")).await).await;
        assert_eq!(json["codes"].as_array().unwrap().len(), 2);
        assert_eq!(json["codes"][0]["name"], "Spring Campaign");
        assert_eq!(json["codes"][0]["status"], "valid");

        let json = body_json(send(&state, get("/api/codes/search?q=spring&limit=1")).await).await;
        assert_eq!(json["codes"].as_array().unwrap().len(), 1);

        let json = body_json(send(&state, get("/api/codes/search?q=zzz")).await).await;
        assert!(json["codes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_code_listing() {
        let state = test_state();
        seed(&state, 3, Some("Batch")).await;

        let json = body_json(send(&state, get("/codes?status=bogus&page=0")).await).await;
        assert_eq!(json["total"], 3);
        assert_eq!(json["page"], 1);
        assert_eq!(json["filter_status"], "all");
        assert_eq!(json["has_next"], false);

        let json = body_json(send(&state, get("/codes?status=used")).await).await;
        assert_eq!(json["total"], 0);
    }

    #[tokio::test]
    async fn test_csv_export_statuses() {
        let state = test_state();
        let codes = seed(&state, 3, None).await;

        state
            .code_service
            .redeem(&codes[0].code, Some("alice"), Utc::now())
            .await
            .unwrap();

        let uri = format!("/api/code/{}/toggle", codes[1].id);
        let response = send(&state, post_form(&uri, "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["is_active"], false);

        let response = send(&state, get("/export-codes")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("activation_codes_"));

        let csv = String::from_utf8(body_bytes(response).await).unwrap();
        let line_for = |code: &str| csv.lines().find(|l| l.starts_with(code)).unwrap().to_string();

        assert!(csv.starts_with("Code,Name,Status,Uses,Max Uses,Created,Expires,Used By,Used At"));
        assert!(line_for(&codes[0].code).contains(",Used,"));
        assert!(line_for(&codes[1].code).contains(",Inactive,"));
        assert!(line_for(&codes[2].code).contains(",Valid,"));

        let response = send(&state, get("/export-codes?status=used")).await;
        let csv = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_toggle_and_delete_unknown_code() {
        let state = test_state();

        let response = send(&state, post_form("/api/code/999/toggle", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&state, post_form("/api/code/abc/delete", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_code() {
        let state = test_state();
        let code = seed(&state, 1, None).await.remove(0);

        let uri = format!("/api/code/{}/delete", code.id);
        let response = send(&state, post_form(&uri, "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);

        let response = send(&state, post_form(&uri, "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_check_code() {
        let state = test_state();
        let code = seed(&state, 1, None).await.remove(0);

        let uri = format!("/api/code/{}/check", code.code.to_lowercase());
        let response = send(&state, get(&uri)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["found"], true);
        assert_eq!(json["valid"], true);
        assert_eq!(json["uses_remaining"], 1);

        let response = send(&state, get("/api/code/MISSING/check")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["found"], false);

        let stored = state.code_service.check(&code.code).await.unwrap().unwrap();
        assert_eq!(stored.uses_count, 0);
    }

    #[tokio::test]
    async fn test_qr_code_png() {
        let state = test_state();

        let response = send(&state, get("/api/qr/ANY-CODE")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let png = body_bytes(response).await;
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn test_dashboard_views() {
        let state = test_state();
        seed(&state, 2, None).await;

        let json = body_json(send(&state, get("/")).await).await;
        assert_eq!(json["stats"]["total"], 2);
        assert_eq!(json["recent_codes"].as_array().unwrap().len(), 2);
        assert!(json.get("daily").is_none());

        let json = body_json(send(&state, get("/statistics")).await).await;
        assert_eq!(json["daily"].as_array().unwrap().len(), 7);
        assert_eq!(json["daily"][6]["generated_count"], 2);
        assert_eq!(json["daily"][6]["used_count"], 0);
        assert_eq!(json["stats"]["usage_rate"], 0.0);
    }

    #[tokio::test]
    async fn test_api_key_management() {
        let state = test_state();

        let json = body_json(send(&state, get("/api-key")).await).await;
        assert!(json["api_key"].is_null());

        let response = send(&state, post_form("/generate-api-key", "name=Docs")).await;
        let json = body_json(response).await;
        assert_eq!(json["api_key"]["name"], "Docs");
        let first = json["api_key"]["key"].as_str().unwrap().to_string();
        assert!(first.starts_with("cvk_"));

        let response = send(&state, post_form("/regenerate-api-key", "")).await;
        let json = body_json(response).await;
        assert_eq!(json["api_key"]["name"], "Regenerated API Key");
        assert_ne!(json["api_key"]["key"], first.as_str());

        let request = Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("x-api-key", first.as_str())
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&state, request).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_security_headers_applied() {
        let state = test_state();

        let response = send(&state, get("/health")).await;
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    }
}
