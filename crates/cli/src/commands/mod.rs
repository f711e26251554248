pub mod build;
pub mod chunks;
pub mod config_cmd;
pub mod doctor;
pub mod onboard;
pub mod show;

use lorewiki_config::{AppConfig, ConfigError};
use std::path::{Path, PathBuf};

/// The config file in effect: `--config` if given, else the default lookup.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path)
}

/// Load the config in effect, with environment overrides applied.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    AppConfig::load_with_overrides(&config_path(explicit))
}
