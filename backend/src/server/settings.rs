//! Server settings loaded via OrthoConfig.

use std::path::PathBuf;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::inbound::http::error::ErrorMode;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: i64 = 3600;
const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024;
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_SESSION_TTL_DAYS: i64 = 90;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// The environment mode is not recognised.
    #[error("invalid environment '{value}'; expected development or production")]
    InvalidEnvironment {
        /// Raw configured value.
        value: String,
    },
    /// A numeric setting must be positive.
    #[error("{name} must be greater than zero")]
    NotPositive {
        /// Setting name.
        name: &'static str,
    },
}

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Verbose errors, ephemeral session keys and human-readable logs.
    Development,
    /// Restricted errors, mandatory session keys and JSON logs.
    Production,
}

impl Environment {
    /// Parse a configured mode name.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidEnvironment`] for unknown names.
    ///
    /// # Examples
    /// ```
    /// use tour_booking::server::Environment;
    ///
    /// assert_eq!(Environment::parse("Development"), Ok(Environment::Development));
    /// assert!(Environment::parse("staging").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, SettingsError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(SettingsError::InvalidEnvironment {
                value: raw.to_owned(),
            }),
        }
    }

    /// Canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// How much error detail clients see.
    #[must_use]
    pub fn error_mode(self) -> ErrorMode {
        match self {
            Self::Development => ErrorMode::Verbose,
            Self::Production => ErrorMode::Restricted,
        }
    }

    /// Whether this is the development mode.
    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Configuration values for the HTTP server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TOURS")]
pub struct ServerSettings {
    /// `development` or `production`.
    pub environment: Option<String>,
    /// Interface to bind.
    pub host: Option<String>,
    /// Port to bind.
    pub port: Option<u16>,
    /// Requests allowed per client and window.
    pub rate_limit_max: Option<u32>,
    /// Rate-limit window length in seconds.
    pub rate_limit_window_secs: Option<i64>,
    /// Maximum JSON or form body size in bytes.
    pub body_limit_bytes: Option<usize>,
    /// File holding the session key material.
    pub session_key_file: Option<PathBuf>,
    /// Mark session cookies `Secure`.
    #[ortho_config(default = true)]
    pub cookie_secure: bool,
    /// Session lifetime in days.
    pub session_ttl_days: Option<i64>,
}

fn positive(value: i64, name: &'static str) -> Result<i64, SettingsError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(SettingsError::NotPositive { name })
    }
}

impl ServerSettings {
    /// Configured mode, defaulting to production.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidEnvironment`] for unknown names.
    pub fn environment(&self) -> Result<Environment, SettingsError> {
        self.environment
            .as_deref()
            .map_or(Ok(Environment::Production), Environment::parse)
    }

    /// Host and port to bind.
    pub fn bind_addr(&self) -> (String, u16) {
        (
            self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    /// Requests allowed per window.
    ///
    /// # Errors
    /// Returns [`SettingsError::NotPositive`] for a zero budget.
    pub fn rate_limit_max(&self) -> Result<u32, SettingsError> {
        match self.rate_limit_max.unwrap_or(DEFAULT_RATE_LIMIT_MAX) {
            0 => Err(SettingsError::NotPositive {
                name: "rate_limit_max",
            }),
            budget => Ok(budget),
        }
    }

    /// Rate-limit window.
    ///
    /// # Errors
    /// Returns [`SettingsError::NotPositive`] for a non-positive window.
    pub fn rate_limit_window(&self) -> Result<TimeDelta, SettingsError> {
        let secs = self
            .rate_limit_window_secs
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS);
        positive(secs, "rate_limit_window_secs").map(TimeDelta::seconds)
    }

    /// Body size limit in bytes.
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_bytes.unwrap_or(DEFAULT_BODY_LIMIT_BYTES)
    }

    /// Session key file, falling back to the mounted secret path.
    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Session lifetime.
    ///
    /// # Errors
    /// Returns [`SettingsError::NotPositive`] for a non-positive lifetime.
    pub fn session_ttl(&self) -> Result<TimeDelta, SettingsError> {
        let days = self.session_ttl_days.unwrap_or(DEFAULT_SESSION_TTL_DAYS);
        positive(days, "session_ttl_days").map(TimeDelta::days)
    }
}
