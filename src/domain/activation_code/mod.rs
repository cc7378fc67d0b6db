//! Activation code domain
//!
//! Entities, validity rules and the repository contract for activation codes.

mod entity;
mod query;
mod repository;
mod validity;

pub use entity::{normalize_code, ActivationCode, CodeId, NewActivationCode};
pub use query::{
    CodeQuery, Page, StatusFilter, TimeWindow, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, PAGE_SIZE,
};
pub use repository::ActivationCodeRepository;
pub use validity::{ExportStatus, Redemption, Validity};

#[cfg(test)]
pub use repository::MockActivationCodeRepository;
