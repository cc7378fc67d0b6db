//! Browser-facing endpoints: form posts, listings, dashboard and export

pub mod api_keys;
pub mod codes;
pub mod dashboard;

use std::collections::HashMap;

use axum::{
    extract::{rejection::FormRejection, Form},
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Raw form or query fields
pub type FormFields = HashMap<String, String>;

/// Create the web router
pub fn create_web_router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/statistics", get(dashboard::statistics))
        .route("/generate", post(codes::generate_codes))
        .route("/validate", post(codes::validate_code))
        .route("/codes", get(codes::list_codes))
        .route("/export-codes", get(codes::export_codes))
        .route("/api-key", get(api_keys::get_api_key))
        .route("/generate-api-key", post(api_keys::generate_api_key))
        .route("/regenerate-api-key", post(api_keys::regenerate_api_key))
}

/// Form fields, treating an unreadable body as an empty form
pub(crate) fn form_fields(form: Result<Form<FormFields>, FormRejection>) -> FormFields {
    form.map(|Form(fields)| fields).unwrap_or_default()
}

pub(crate) fn field<'a>(fields: &'a FormFields, name: &str) -> Option<&'a str> {
    fields.get(name).map(String::as_str)
}
