//! Development data configuration loaded via OrthoConfig.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

fn default_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("dev-data")
}

/// Configuration controlling fixture seeding at startup.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DEV_DATA")]
pub struct DevDataSettings {
    /// Load the fixtures into the store on startup.
    #[ortho_config(default = false)]
    pub enabled: bool,
    /// Directory holding `tours.json`, `users.json` and `reviews.json`.
    pub data_dir: Option<PathBuf>,
}

impl DevDataSettings {
    /// Return the configured fixture directory, falling back to the bundled one.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}
