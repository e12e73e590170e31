//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use rotator_config::load_validated;

pub fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_validated(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Universe: {} securities", config.engine.universe.len());
            println!("Lookback: {}", config.engine.lookback);
            println!("Schedule: {:?}", config.engine.schedule);
            println!("Gating: {:?}", config.engine.gating);
            println!("Selection: {:?}", config.engine.selection);
            println!("Min trade value: {}", config.engine.min_trade_value);
            println!("Replay capital: {}", config.replay.initial_capital);
            println!("Data directory: {}", config.replay.data_dir);
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
