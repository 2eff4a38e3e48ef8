//! Opaque token generation and hash-at-rest.
//!
//! Refresh, invite, and reset tokens are 256 bits of entropy in a URL-safe
//! alphabet. Only the SHA-256 digest is persisted; lookup is by hash.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Generate a fresh opaque token. Returns (raw, hash); the raw form is for
/// the issuing response only and must never be persisted.
pub fn generate_opaque_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw = URL_SAFE_NO_PAD.encode(bytes);
    let hash = hash_token(&raw);
    (raw, hash)
}

/// One-way hash used for storage and lookup.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_url_safe_and_unique() {
        let (raw1, hash1) = generate_opaque_token();
        let (raw2, _) = generate_opaque_token();

        assert_ne!(raw1, raw2);
        assert_eq!(raw1.len(), 43); // 32 bytes, base64 url-safe, no padding
        assert!(raw1
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn presented_raw_token_finds_the_stored_hash() {
        let (raw, stored_hash) = generate_opaque_token();
        assert_eq!(hash_token(&raw), stored_hash);
        assert_ne!(hash_token("tampered"), stored_hash);
    }
}
