//! Domain layer - Core business logic and entities

pub mod activation_code;
pub mod api_key;
pub mod error;
pub mod statistics;

pub use activation_code::{
    normalize_code, ActivationCode, ActivationCodeRepository, CodeId, CodeQuery, ExportStatus,
    NewActivationCode, Page, Redemption, StatusFilter, TimeWindow, Validity,
};
pub use api_key::{ApiKey, ApiKeyId, ApiKeyRepository, NewApiKey, RotatedApiKey};
pub use error::DomainError;
pub use statistics::{CodeStatistics, DailyActivity};
