//! Password hashing collaborator.
//!
//! The core only talks to the [`PasswordHasher`] trait; the bundled
//! [`Argon2Hasher`] is the default host-side implementation.

use crate::auth::error::AuthError;
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::Argon2;

pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing (PHC) string.
    ///
    /// # Errors
    /// Returns `AuthError::PasswordHash` if hashing fails.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a plaintext password against a stored hash. An unparseable
    /// hash verifies as false, never as an error.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|err| AuthError::PasswordHash(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("secret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("secret", &hash));
        assert!(!hasher.verify("other", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = Argon2Hasher;
        assert_ne!(
            hasher.hash("secret").unwrap(),
            hasher.hash("secret").unwrap()
        );
    }

    #[test]
    fn unparseable_hash_verifies_false() {
        let hasher = Argon2Hasher;
        assert!(!hasher.verify("secret", "not-a-phc-string"));
    }
}
