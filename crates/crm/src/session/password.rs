//! Password hashing primitive, injected into the services that need it.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;
use secrecy::{ExposeSecret, SecretString};

use crate::error::CrmError;

/// Turns passwords into storable hashes and checks them again.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &SecretString) -> Result<String, CrmError>;

    /// `false` for a wrong password and for an unreadable hash alike.
    fn verify(&self, password: &SecretString, hash: &str) -> bool;
}

/// Argon2id with the crate's default parameters (PHC string output).
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &SecretString) -> Result<String, CrmError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CrmError::Storage(format!("password hashing failed: {e}")))
    }

    fn verify(&self, password: &SecretString, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .is_ok()
    }
}
