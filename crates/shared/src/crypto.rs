//! Hashing helpers for invite tokens.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hashes `input` followed by `salt`.
pub fn salted_sha256_hex(input: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares two strings without short-circuiting on the first differing byte.
///
/// Lengths are not secret here: both sides are fixed-width digests.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_salted_hash_is_hash_of_concatenation() {
        assert_eq!(salted_sha256_hex("te", "st"), sha256_hex("test"));
        assert_eq!(salted_sha256_hex("test", ""), sha256_hex("test"));
    }

    #[test]
    fn test_salted_hash_depends_on_salt() {
        assert_ne!(
            salted_sha256_hex("abc", "salt-one"),
            salted_sha256_hex("abc", "salt-two")
        );
    }

    #[test]
    fn test_constant_time_eq() {
        let digest = sha256_hex("token");
        assert!(constant_time_eq(&digest, &sha256_hex("token")));
        assert!(!constant_time_eq(&digest, &sha256_hex("other")));
        assert!(!constant_time_eq(&digest, ""));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_constant_time_eq_length_mismatch() {
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(!constant_time_eq("abcd", "abc"));
        assert!(!constant_time_eq("abd", "abc"));
    }
}
