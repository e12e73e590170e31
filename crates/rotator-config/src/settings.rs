//! Configuration structures.

use chrono::NaiveDate;
use rotator_engine::RotationConfig;
use rotator_replay::ReplayConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::SettingsError;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: RotationConfig,
    #[serde(default)]
    pub replay: ReplaySettings,
}

impl AppConfig {
    /// Check every section that has constraints.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.engine.validate()?;
        self.replay.validate()
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "rotator".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Replay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    pub initial_capital: Decimal,
    pub commission: Decimal,
    pub slippage_pct: Decimal,
    pub allow_margin: bool,
    /// Directory holding one CSV per security
    pub data_dir: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub channel_buffer: usize,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            commission: Decimal::ZERO,
            slippage_pct: dec!(0.05),
            allow_margin: true,
            data_dir: "data".to_string(),
            start_date: None,
            end_date: None,
            channel_buffer: 1024,
        }
    }
}

impl ReplaySettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(SettingsError::Replay(
                "Initial capital must be positive".into(),
            ));
        }
        if self.commission < Decimal::ZERO || self.slippage_pct < Decimal::ZERO {
            return Err(SettingsError::Replay(
                "Commission and slippage cannot be negative".into(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(SettingsError::Replay(format!(
                    "Start date {start} is after end date {end}"
                )));
            }
        }
        Ok(())
    }

    /// Runner configuration for these settings.
    pub fn runner_config(&self) -> ReplayConfig {
        ReplayConfig {
            initial_capital: self.initial_capital,
            commission: self.commission,
            slippage_pct: self.slippage_pct,
            allow_margin: self.allow_margin,
            channel_buffer: self.channel_buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_validation() {
        assert!(ReplaySettings::default().validate().is_ok());

        let settings = ReplaySettings {
            initial_capital: Decimal::ZERO,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = ReplaySettings {
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_runner_config() {
        let settings = ReplaySettings {
            allow_margin: false,
            ..Default::default()
        };
        let runner = settings.runner_config();
        assert!(!runner.allow_margin);
        assert_eq!(runner.initial_capital, dec!(100000));
    }

    #[test]
    fn test_to_toml() {
        let mut config = AppConfig::default();
        config.engine.universe = vec!["AAA".into()];
        let text = config.to_toml().unwrap();
        assert!(text.contains("[engine]"));
        assert!(text.contains("lookback = 20"));
    }
}
