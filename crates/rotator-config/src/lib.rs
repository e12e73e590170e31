//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, LoggingConfig, ReplaySettings};

use config::{Config, ConfigError, Environment, File};
use rotator_core::error::EngineError;
use std::path::Path;
use thiserror::Error;

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid engine section: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid replay section: {0}")]
    Replay(String),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load configuration from file and environment.
///
/// Environment variables use the `ROTATOR` prefix and `__` as the section
/// separator, e.g. `ROTATOR__ENGINE__LOOKBACK=60`. `ROTATOR__ENGINE__UNIVERSE`
/// takes a comma-separated list.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("ROTATOR")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("engine.universe")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

/// Load and validate in one step.
pub fn load_validated(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = load_config(path)?;
    config.validate()?;
    Ok(config)
}
