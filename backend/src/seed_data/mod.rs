//! Startup wiring for development data seeding.

mod config;
mod startup;

pub use config::DevDataSettings;
pub use startup::{SeedOutcome, StartupSeedingError, seed_dev_data_on_startup};
