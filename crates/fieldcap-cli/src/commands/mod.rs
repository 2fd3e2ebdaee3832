pub mod config;
pub mod process;
pub mod replay;

use std::path::{Path, PathBuf};

use fieldcap_core::FieldcapConfig;
use tracing::debug;

/// Platform config location, e.g. `~/.config/fieldcap/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fieldcap")
        .join("config.json")
}

/// Load the explicit config, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FieldcapConfig> {
    if let Some(path) = config_path {
        return Ok(FieldcapConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(FieldcapConfig::from_file(&default_path)?)
    } else {
        Ok(FieldcapConfig::default())
    }
}
