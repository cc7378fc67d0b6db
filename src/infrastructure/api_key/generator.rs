//! API Key generation
//!
//! Keys are a fixed prefix followed by lowercase hex from the thread-local
//! CSPRNG.

use rand::RngCore;

/// Prefix carried by every issued key
pub const API_KEY_PREFIX: &str = "cvk_";

const KEY_BYTES: usize = 24;

/// Generator for API key secrets
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    prefix: String,
}

impl ApiKeyGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Generate a new secret, e.g. `cvk_` followed by 48 hex characters
    pub fn generate(&self) -> String {
        let mut random_bytes = [0u8; KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        format!("{}{}", self.prefix, hex::encode(random_bytes))
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::new(API_KEY_PREFIX)
    }
}

/// Constant-time string comparison for secrets
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
