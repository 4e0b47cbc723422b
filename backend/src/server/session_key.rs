//! Session key loading and fingerprinting.
//!
//! Production requires key material of at least 64 bytes in the configured
//! file. Development falls back to a temporary key when the file is missing.
//! The fingerprint is a truncated SHA-256 of the signing key so operators can
//! tell which key is active without exposing it.

use std::io;
use std::path::{Path, PathBuf};

use actix_web::cookie::Key;
use cap_std::{ambient_authority, fs::Dir};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroize;

use crate::server::settings::Environment;

const SESSION_KEY_MIN_LEN: usize = 64;
const FINGERPRINT_BYTES: usize = 8;

/// Errors raised while loading the session key.
#[derive(Debug, Error)]
pub enum SessionKeyError {
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        /// Configured key path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The key file is too short to derive a key from.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        /// Configured key path.
        path: PathBuf,
        /// Bytes found.
        length: usize,
        /// Bytes required.
        min_len: usize,
    },
}

fn read_key_file(path: &Path) -> io::Result<Vec<u8>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "session key path must be a file")
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read(Path::new(file_name))
}

/// Load the session key for `environment`.
///
/// # Errors
/// In production, fails when the file cannot be read or is shorter than 64
/// bytes. Development only fails on short keys.
pub fn load_session_key(path: &Path, environment: Environment) -> Result<Key, SessionKeyError> {
    match read_key_file(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionKeyError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if environment.is_development() => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionKeyError::KeyRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Generate a truncated SHA-256 fingerprint of the key's signing material.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use tour_booking::server::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.signing());
    let digest = hasher.finalize();
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
