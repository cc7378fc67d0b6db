//! Request and response types shared by the HTTP handlers

pub mod code;
pub mod error;
pub mod json;
pub mod params;

pub use code::{
    redemption_status, ApiKeyResponse, CheckResponse, CodeListResponse, CodeResponse, DashboardResponse,
    GenerateResponse, SearchResponse, SuccessResponse, ToggleResponse, ValidateResponse,
};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
