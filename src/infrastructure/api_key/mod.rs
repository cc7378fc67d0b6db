//! API Key infrastructure implementations
//!
//! Key generation, in-memory and PostgreSQL storage, and the service used
//! by the authentication extractor.

mod generator;
mod postgres;
mod repository;
mod service;

pub use generator::{ApiKeyGenerator, API_KEY_PREFIX};
pub use postgres::PostgresApiKeyRepository;
pub use repository::InMemoryApiKeyRepository;
pub use service::{ApiKeyService, DEFAULT_KEY_NAME, REGENERATED_KEY_NAME};
