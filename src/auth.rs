//! # Per-Call Authentication
//!
//! Salted challenge material carried in every request envelope.
//!
//! Each outbound call creates a fresh random salt and a SHA-256 digest
//! binding `ident ‖ salt ‖ secret`, so the presented hash differs on every
//! call and the secret itself never travels. The receiver looks up the
//! secret for the presented identity, recomputes the digest over the
//! presented salt, and compares. No session state survives the call.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Salt length in bytes, freshly randomized per call.
pub const SALT_SIZE: usize = 16;
/// Digest length in bytes (SHA-256).
pub const HASH_SIZE: usize = 32;

/// Authentication material for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    #[serde(with = "serde_bytes")]
    pub ident: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub salt: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub hash: Vec<u8>,
}

impl Auth {
    /// Build fresh material for one outbound call: new salt, new digest.
    pub fn create(ident: &[u8], secret: &[u8]) -> Self {
        let salt = create_salt();
        let hash = create_hash(ident, secret, &salt);
        Self {
            ident: ident.to_vec(),
            salt: salt.to_vec(),
            hash: hash.to_vec(),
        }
    }
}

/// Generate a fresh random salt.
pub fn create_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Digest binding identity, salt, and secret.
pub fn create_hash(ident: &[u8], secret: &[u8], salt: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(ident);
    hasher.update(salt);
    hasher.update(secret);
    hasher.finalize().into()
}

/// Recompute the digest from the presented identity and salt and compare
/// against the presented hash.
///
/// The comparison scans every byte of the digest; it does not stop at the
/// first mismatch.
pub fn check_hash(ident: &[u8], secret: &[u8], salt: &[u8], presented: &[u8]) -> bool {
    let local = create_hash(ident, secret, salt);
    if presented.len() != local.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in local.iter().zip(presented.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_material_verifies() {
        let auth = Auth::create(b"qwert", b"12345");
        assert_eq!(auth.salt.len(), SALT_SIZE);
        assert_eq!(auth.hash.len(), HASH_SIZE);
        assert!(check_hash(&auth.ident, b"12345", &auth.salt, &auth.hash));
    }

    #[test]
    fn salt_changes_every_call() {
        let a = Auth::create(b"user", b"secret");
        let b = Auth::create(b"user", b"secret");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let auth = Auth::create(b"qwert", b"12345");
        assert!(!check_hash(&auth.ident, b"54321", &auth.salt, &auth.hash));
    }

    #[test]
    fn any_single_byte_mutation_is_rejected() {
        let auth = Auth::create(b"qwert", b"12345");

        for i in 0..auth.salt.len() {
            let mut salt = auth.salt.clone();
            salt[i] ^= 0x01;
            assert!(!check_hash(&auth.ident, b"12345", &salt, &auth.hash));
        }
        for i in 0..auth.ident.len() {
            let mut ident = auth.ident.clone();
            ident[i] ^= 0x01;
            assert!(!check_hash(&ident, b"12345", &auth.salt, &auth.hash));
        }
        for i in 0..auth.hash.len() {
            let mut hash = auth.hash.clone();
            hash[i] ^= 0x01;
            assert!(!check_hash(&auth.ident, b"12345", &auth.salt, &hash));
        }
    }

    #[test]
    fn truncated_hash_is_rejected() {
        let auth = Auth::create(b"qwert", b"12345");
        assert!(!check_hash(
            &auth.ident,
            b"12345",
            &auth.salt,
            &auth.hash[..HASH_SIZE - 1]
        ));
    }
}
