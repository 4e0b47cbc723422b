//! Argon2id implementation of the [`PasswordHasher`] port.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Hashes passwords with Argon2id and the crate's default parameters.
#[derive(Debug, Default, Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Create a hasher with default Argon2id parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let parsed =
            PasswordHash::new(hash).map_err(|err| PasswordHashError::malformed_hash(err.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(PasswordHashError::hash(err.to_string())),
        }
    }
}
