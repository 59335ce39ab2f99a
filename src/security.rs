use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::constants::API_KEY_BYTES;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// API Keys
// =============================================================================

/// Generate a fresh opaque API key
///
/// 16 random bytes from the thread-local CSPRNG, hex encoded (32 characters).
/// The plaintext key is handed to the user exactly once, at registration.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; API_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Derive the stored fingerprint of an API key
///
/// Only the fingerprint is persisted, so a leaked users table does not hand
/// out working credentials. Lookups fingerprint the presented key and search
/// for an exact match.
///
/// # Algorithm
/// `fingerprint = hex(HMAC-SHA256(pepper, api_key))`
pub fn fingerprint_api_key(api_key: &str, pepper: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(pepper.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return String::new();
        }
    };
    mac.update(api_key.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_api_key_format() {
        let key = generate_api_key();

        assert_eq!(key.len(), API_KEY_BYTES * 2);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_api_key_unique() {
        let a = generate_api_key();
        let b = generate_api_key();

        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let result1 = fingerprint_api_key("abc123", "my-pepper");
        let result2 = fingerprint_api_key("abc123", "my-pepper");

        assert_eq!(result1, result2);
        assert_eq!(result1.len(), 64);
    }

    #[test]
    fn test_fingerprint_different_keys() {
        let pepper = "same-pepper";

        assert_ne!(
            fingerprint_api_key("key1", pepper),
            fingerprint_api_key("key2", pepper)
        );
    }

    #[test]
    fn test_fingerprint_different_peppers() {
        assert_ne!(
            fingerprint_api_key("same-key", "pepper1"),
            fingerprint_api_key("same-key", "pepper2")
        );
    }

    #[test]
    fn test_fingerprint_is_not_plaintext() {
        let key = generate_api_key();
        let fingerprint = fingerprint_api_key(&key, "pepper");

        assert!(!fingerprint.contains(&key));
    }
}
