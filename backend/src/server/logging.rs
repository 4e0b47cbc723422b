//! Tracing subscriber setup.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use crate::server::settings::Environment;

/// Install the global subscriber: JSON lines in production, human-readable
/// output in development. `RUST_LOG` overrides the default level.
pub fn init_tracing(environment: Environment) {
    let default_level = if environment.is_development() {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let result = match environment {
        Environment::Production => fmt().with_env_filter(filter).json().try_init(),
        Environment::Development => fmt().with_env_filter(filter).try_init(),
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}
