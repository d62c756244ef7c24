//! Salted password digests.
//!
//! Stored form is `{salt_hex}${digest_hex}` where the digest is SHA-256
//! over salt bytes followed by the password. The stored value is opaque to
//! everything outside this module.

use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest a password under a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    format!("{}${}", hex::encode(salt), digest(&salt, password))
}

/// Check a password against a stored digest.
///
/// Malformed stored values verify as false rather than erroring; they can
/// only mean the record was tampered with or predates this scheme.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, expected)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    digest(&salt, password) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let stored = hash_password("correct horse battery staple");
        assert!(verify_password("correct horse battery staple", &stored));
        assert!(!verify_password("wrong password", &stored));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same password");
        let b = hash_password("same password");
        assert_ne!(a, b);
        assert!(verify_password("same password", &a));
        assert!(verify_password("same password", &b));
    }

    #[test]
    fn test_malformed_stored_value() {
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("anything", "zz-not-hex$digest"));
        assert!(!verify_password("anything", ""));
    }
}
