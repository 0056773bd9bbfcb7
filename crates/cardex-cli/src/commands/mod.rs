//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod output;
pub mod process;
pub mod sidecar;
pub mod validate;

use std::path::Path;

use tracing::debug;

use cardex_core::CardexConfig;

/// Load the configuration named by `--config`, else the user config file if
/// present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<CardexConfig> {
    if let Some(path) = config_path {
        return Ok(CardexConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config from {}", default_path.display());
        Ok(CardexConfig::from_file(&default_path)?)
    } else {
        Ok(CardexConfig::default())
    }
}
