//! Static API key check for the `X-API-Key` header.
//!
//! Only the SHA-256 digest of the configured key is kept in memory, and
//! presented keys are compared digest to digest.

use sha2::{Digest, Sha256};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Number of leading characters of a rejected key that may be logged.
const LOGGED_PREFIX_LEN: usize = 4;

/// Holds the digest of the one accepted API key.
#[derive(Clone)]
pub struct ApiKeyVerifier {
    digest: Vec<u8>,
}

impl ApiKeyVerifier {
    pub fn new(key: &str) -> Self {
        Self {
            digest: Sha256::digest(key.as_bytes()).to_vec(),
        }
    }

    /// True when `presented` is the configured key.
    pub fn verify(&self, presented: &str) -> bool {
        let presented = Sha256::digest(presented.as_bytes());
        presented
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for ApiKeyVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKeyVerifier(..)")
    }
}

/// Short prefix of a presented key that is safe to put in a log line.
pub fn redacted_prefix(presented: &str) -> String {
    let prefix: String = presented.chars().take(LOGGED_PREFIX_LEN).collect();
    format!("{prefix}...")
}
