//! Password Hasher
//! Mission: One-way salted hashing with bcrypt

use crate::auth::error::AuthError;
use bcrypt::{hash, verify, DEFAULT_COST};

/// Hash a plaintext password. The per-call random salt is embedded in the
/// bcrypt output string.
pub fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    hash(plaintext, DEFAULT_COST)
        .map_err(|e| AuthError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// Returns `false` (never errors) for malformed stored hashes, so a corrupt
/// record behaves like a failed login rather than a 500.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    verify(plaintext, stored_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hashed = hash_password("secret1").unwrap();
        assert!(verify_password("secret1", &hashed));
        assert!(!verify_password("secret2", &hashed));
    }

    #[test]
    fn test_hash_is_salted_per_call() {
        let h1 = hash_password("same-password").unwrap();
        let h2 = hash_password("same-password").unwrap();

        // Different salts produce different hashes for identical input
        assert_ne!(h1, h2);
        assert!(verify_password("same-password", &h1));
        assert!(verify_password("same-password", &h2));
    }

    #[test]
    fn test_verify_malformed_hash_returns_false() {
        assert!(!verify_password("secret1", "not-a-bcrypt-hash"));
        assert!(!verify_password("secret1", ""));
        assert!(!verify_password("secret1", "$2b$12$truncated"));
    }
}
