//! Activation code generation
//!
//! Produces human-friendly codes from an alphabet without look-alike
//! characters, using the thread-local CSPRNG.

use rand::Rng;

/// Uppercase letters and digits minus O, 0, I, 1 and L
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Number of random characters in a code
pub const CODE_LENGTH: usize = 12;

const GROUP_SIZE: usize = 4;

/// Generator for activation code strings
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    group_size: usize,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            length: CODE_LENGTH,
            group_size: GROUP_SIZE,
        }
    }

    /// Generate a code, e.g. `ABCD-EFGH-JKMN` or `PROMO-ABCD-EFGH-JKMN`
    pub fn generate(&self, prefix: Option<&str>) -> String {
        let mut rng = rand::thread_rng();
        let random: String = (0..self.length)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();

        let grouped = self.group(&random);

        match prefix.map(|p| p.trim().to_uppercase()).filter(|p| !p.is_empty()) {
            Some(prefix) => format!("{}-{}", prefix, grouped),
            None => grouped,
        }
    }

    fn group(&self, run: &str) -> String {
        run.as_bytes()
            .chunks(self.group_size)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
