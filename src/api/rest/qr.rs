//! QR code images

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;

/// GET /api/qr/{code}
///
/// Renders whatever text is given; the code does not have to exist.
pub async fn qr_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(code = %code, "Rendering QR code");

    let png = state.qr_renderer.render_png(&code)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
