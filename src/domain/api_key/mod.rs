//! API Key domain
//!
//! Domain types and the repository contract for the keys that gate
//! programmatic code generation.

mod entity;
mod repository;

pub use entity::{ApiKey, ApiKeyId, NewApiKey, RotatedApiKey};
pub use repository::ApiKeyRepository;
