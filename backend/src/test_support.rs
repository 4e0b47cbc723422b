//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// A clock that stands still until a test moves it.
///
/// # Examples
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use mockable::Clock;
/// use tour_booking::test_support::MutableClock;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let clock = MutableClock::new(start);
/// clock.advance_seconds(60);
/// assert_eq!((clock.utc() - start).num_seconds(), 60);
/// ```
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward.
    ///
    /// # Panics
    /// Panics if a previous holder of the lock panicked.
    pub fn advance_seconds(&self, seconds: i64) {
        let mut now = self.0.lock().expect("clock lock");
        *now += TimeDelta::seconds(seconds);
    }

    /// Move the clock to `at`.
    ///
    /// # Panics
    /// Panics if a previous holder of the lock panicked.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock().expect("clock lock") = at;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock lock")
    }
}

const PLAIN_PREFIX: &str = "plain$";

/// A transparent hasher so tests avoid the cost of Argon2.
///
/// Hashes are `plain$<password>`; anything else is rejected as malformed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextHasher;

impl PasswordHasher for PlainTextHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        Ok(format!("{PLAIN_PREFIX}{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        hash.strip_prefix(PLAIN_PREFIX)
            .map(|stored| stored == password)
            .ok_or_else(|| PasswordHashError::malformed_hash("not a plain-text hash"))
    }
}

pub mod cap_fs {
    //! Capability-safe filesystem helpers for tests.
    //!
    //! The backend avoids direct `std::fs` calls. These helpers write fixture
    //! files through `cap_std::fs::Dir`.

    use std::io;
    use std::path::Path;

    use cap_std::{ambient_authority, fs::Dir};

    /// Write `contents` to `name` inside `directory`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tour_booking::test_support::cap_fs::write_file;
    ///
    /// let dir = tempfile::tempdir()?;
    /// write_file(dir.path(), "tours.json", b"[]")?;
    /// assert!(dir.path().join("tours.json").exists());
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn write_file(directory: &Path, name: &str, contents: &[u8]) -> io::Result<()> {
        let directory = Dir::open_ambient_dir(directory, ambient_authority())?;
        directory.write(name, contents)
    }
}
