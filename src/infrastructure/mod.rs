//! Infrastructure layer - Storage backends, services and renderers

pub mod activation_code;
pub mod api_key;
pub mod export;
pub mod logging;
pub mod statistics;
pub mod storage;
