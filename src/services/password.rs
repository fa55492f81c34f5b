//! Password hashing and verification.
//!
//! Hashes are Argon2id PHC strings with a per-password random salt. Plaintext
//! passwords never leave this module.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};

#[derive(Debug, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordHashError(String);

pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordHashError(e.to_string()))
}

/// Checks `password` against a stored hash. A hash that fails to parse is a
/// mismatch, never an error.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_accepts_original_password() {
        for password in ["password123", "correct horse battery staple", "ünïcødé-pässwörd", ""] {
            let hash = hash_password(password).unwrap();
            assert!(verify_password(password, &hash), "failed for {:?}", password);
        }
    }

    #[test]
    fn test_verify_rejects_other_passwords() {
        let hash = hash_password("password123").unwrap();
        assert!(!verify_password("password124", &hash));
        assert!(!verify_password("Password123", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn test_hash_is_salted_and_not_plaintext() {
        let first = hash_password("password123").unwrap();
        let second = hash_password("password123").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
        assert!(!first.contains("password123"));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("password123", "not-a-hash"));
        assert!(!verify_password("password123", ""));
        assert!(!verify_password("password123", "password123"));
    }
}
