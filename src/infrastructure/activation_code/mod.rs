//! Activation code infrastructure

mod generator;
mod in_memory;
mod postgres;
mod service;

pub use generator::{CodeGenerator, CODE_ALPHABET, CODE_LENGTH};
pub use in_memory::InMemoryActivationCodeRepository;
pub use postgres::PostgresActivationCodeRepository;
pub use service::{ActivationCodeService, GenerateCodesRequest, MAX_GENERATION_ATTEMPTS};
