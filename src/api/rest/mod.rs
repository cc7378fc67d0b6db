//! Programmatic JSON endpoints under `/api`

pub mod codes;
pub mod qr;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create the `/api` router
pub fn create_rest_router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(codes::generate_codes))
        .route("/validate", post(codes::validate_code))
        .route("/code/{id}/toggle", post(codes::toggle_code))
        .route("/code/{id}/delete", post(codes::delete_code))
        // same parameter name as the id routes; check reads it as the code string
        .route("/code/{id}/check", get(codes::check_code))
        .route("/codes/search", get(codes::search_codes))
        .route("/stats", get(codes::stats))
        .route("/qr/{code}", get(qr::qr_code))
}
