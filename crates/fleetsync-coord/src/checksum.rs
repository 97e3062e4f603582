//! Credential checksum derivation.
//!
//! Raw credentials are secrets and must never be persisted or sent to
//! the shared store. Every store interaction is keyed by a SHA-256
//! checksum instead: deterministic, collision-resistant, fixed-length,
//! and not reversible to the original value.

use sha2::{Digest, Sha256};

/// Derives the store key for a raw credential.
///
/// Returns 64 lowercase hex characters. The same credential always maps
/// to the same checksum, which is what lets every instance in the fleet
/// agree on the key without sharing the secret itself.
#[must_use]
pub fn credential_checksum(raw_credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_credential.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_deterministic() {
        let token = "eyJhbGciOiJIUzI1NiJ9.payload.sig";
        assert_eq!(credential_checksum(token), credential_checksum(token));
    }

    #[test]
    fn test_checksum_is_fixed_length_hex() {
        let checksum = credential_checksum("any credential");
        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_credentials_differ() {
        assert_ne!(
            credential_checksum("credential-a"),
            credential_checksum("credential-b")
        );
    }
}
