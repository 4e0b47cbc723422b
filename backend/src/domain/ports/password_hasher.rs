//! Port abstraction for password hashing.
use super::define_port_error;

define_port_error! {
    /// Failures raised by password hashing adapters.
    pub enum PasswordHashError {
        /// The hash could not be computed.
        Hash { message: String } => "password hashing failed: {message}",
        /// The stored hash could not be parsed.
        MalformedHash { message: String } => "stored password hash is malformed: {message}",
    }
}

/// One-way password hashing used for stored credentials.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password with a fresh salt.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}
