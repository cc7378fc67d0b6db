//! API middleware components

pub mod auth;
pub mod logging;
pub mod security;

pub use auth::RequireApiKey;
pub use logging::{logging_middleware, redact_query};
pub use security::security_headers_middleware;
