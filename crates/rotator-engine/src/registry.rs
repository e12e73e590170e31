//! Named engine presets.

use rotator_core::{error::EngineError, types::Security};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    GatingMode, LegConvention, MetricConvention, RebalanceRule, RotationConfig, RotationEngine,
    SelectionPolicy,
};

/// Information about a registered preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    /// Preset name
    pub name: String,
    /// Preset description
    pub description: String,
    /// Default configuration, universe left empty
    pub default_config: RotationConfig,
}

/// Registry of built-in rotation presets.
pub struct PresetRegistry {
    presets: BTreeMap<String, PresetInfo>,
}

impl PresetRegistry {
    /// Create a registry with all built-in presets.
    pub fn new() -> Self {
        let mut presets = BTreeMap::new();

        presets.insert(
            "factor_momentum".to_string(),
            PresetInfo {
                name: "Factor Momentum".to_string(),
                description: "Monthly long top decile / short bottom decile by trailing return"
                    .to_string(),
                default_config: RotationConfig {
                    lookback: 252,
                    schedule: RebalanceRule::MonthStart,
                    metric: MetricConvention::Momentum,
                    selection: SelectionPolicy::Deciles {
                        min_universe: 10,
                        leg_gross_weight: dec!(0.5),
                        legs: LegConvention::LongWinnersShortLosers,
                    },
                    ..Default::default()
                },
            },
        );

        presets.insert(
            "short_term_reversal".to_string(),
            PresetInfo {
                name: "Short-Term Reversal".to_string(),
                description: "Weekly long last week's losers / short last week's winners"
                    .to_string(),
                default_config: RotationConfig {
                    lookback: 5,
                    schedule: RebalanceRule::WeekStart,
                    metric: MetricConvention::Reversal,
                    selection: SelectionPolicy::Deciles {
                        min_universe: 10,
                        leg_gross_weight: dec!(0.5),
                        // Top of a reversal ranking is last week's biggest
                        // decliners, so the long leg holds losers
                        legs: LegConvention::LongWinnersShortLosers,
                    },
                    ..Default::default()
                },
            },
        );

        presets.insert(
            "best_performer".to_string(),
            PresetInfo {
                name: "Best Performer".to_string(),
                description: "Monthly all-in on the best trailing performer, ties split equally"
                    .to_string(),
                default_config: RotationConfig {
                    lookback: 21,
                    schedule: RebalanceRule::MonthStart,
                    gating: GatingMode::UniverseComplete,
                    metric: MetricConvention::Momentum,
                    selection: SelectionPolicy::default(),
                    ..Default::default()
                },
            },
        );

        Self { presets }
    }

    /// List all presets, sorted by key.
    pub fn list(&self) -> Vec<&PresetInfo> {
        self.presets.values().collect()
    }

    /// Get preset info by key.
    pub fn get(&self, name: &str) -> Option<&PresetInfo> {
        self.presets.get(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    pub fn names(&self) -> Vec<&String> {
        self.presets.keys().collect()
    }

    /// Preset config with `overrides` merged over it and `universe` set.
    ///
    /// `overrides` is a JSON object whose keys replace the preset's; pass
    /// `Value::Null` to keep the preset as is.
    pub fn config(
        &self,
        name: &str,
        overrides: serde_json::Value,
        universe: Vec<Security>,
    ) -> Result<RotationConfig, EngineError> {
        let info = self
            .get(name)
            .ok_or_else(|| EngineError::Configuration(format!("Unknown preset: {name}")))?;

        let mut merged = serde_json::to_value(&info.default_config)
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        match (&mut merged, overrides) {
            (_, serde_json::Value::Null) => {}
            (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
                base.extend(patch);
            }
            (_, other) => {
                return Err(EngineError::Configuration(format!(
                    "Preset overrides must be an object, got {other}"
                )))
            }
        }

        let mut config: RotationConfig = serde_json::from_value(merged)
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        config.universe = universe;
        config.validate()?;
        Ok(config)
    }

    /// Build an engine from a preset and universe.
    pub fn create(
        &self,
        name: &str,
        overrides: serde_json::Value,
        universe: Vec<Security>,
    ) -> Result<RotationEngine, EngineError> {
        RotationEngine::new(self.config(name, overrides, universe)?)
    }

    /// Build an engine with the preset's default configuration.
    pub fn create_default(
        &self,
        name: &str,
        universe: Vec<Security>,
    ) -> Result<RotationEngine, EngineError> {
        self.create(name, serde_json::Value::Null, universe)
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe(n: usize) -> Vec<Security> {
        (0..n).map(|i| Security::new(format!("S{i:02}"))).collect()
    }

    #[test]
    fn test_registry_list() {
        let registry = PresetRegistry::new();
        assert_eq!(registry.list().len(), 3);
        assert_eq!(
            registry.names(),
            vec!["best_performer", "factor_momentum", "short_term_reversal"]
        );
    }

    #[test]
    fn test_registry_get() {
        let registry = PresetRegistry::new();

        assert!(registry.get("factor_momentum").is_some());
        assert!(registry.get("unknown").is_none());
        assert!(!registry.exists("unknown"));
    }

    #[test]
    fn test_create_default() {
        let registry = PresetRegistry::new();

        let engine = registry.create_default("best_performer", universe(3)).unwrap();
        assert_eq!(engine.config().universe.len(), 3);
        assert_eq!(engine.state().selector, "best_performer");
    }

    #[test]
    fn test_create_with_overrides() {
        let registry = PresetRegistry::new();

        let config = registry
            .config(
                "factor_momentum",
                serde_json::json!({ "lookback": 60, "min_trade_value": "250" }),
                universe(20),
            )
            .unwrap();

        assert_eq!(config.lookback, 60);
        assert_eq!(config.min_trade_value, dec!(250));
        assert_eq!(config.schedule, RebalanceRule::MonthStart);
    }

    #[test]
    fn test_create_requires_universe() {
        let registry = PresetRegistry::new();
        assert!(registry.create_default("factor_momentum", vec![]).is_err());
    }

    #[test]
    fn test_create_unknown_preset() {
        let registry = PresetRegistry::new();

        let result = registry.create_default("unknown", universe(3));
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_short_term_reversal_buys_losers() {
        use crate::BarOutcome;
        use chrono::NaiveDate;
        use rotator_core::error::BrokerError;
        use rotator_core::traits::Broker;
        use rotator_core::types::{DailyBar, Order, OrderIntent, Side};
        use rust_decimal::Decimal;

        #[derive(Default)]
        struct Recorder(Vec<OrderIntent>);

        impl Broker for Recorder {
            fn position_volume(&self, _security: &Security) -> Decimal {
                Decimal::ZERO
            }
            fn portfolio_value(&self) -> Decimal {
                dec!(1000)
            }
            fn submit_market_order(&mut self, intent: &OrderIntent) -> Result<Order, BrokerError> {
                self.0.push(intent.clone());
                Ok(Order::from_intent(intent))
            }
            fn name(&self) -> &str {
                "recorder"
            }
        }

        let registry = PresetRegistry::new();
        let names = universe(10);
        let mut engine = registry
            .create(
                "short_term_reversal",
                serde_json::json!({ "lookback": 1, "schedule": { "type": "daily" } }),
                names.clone(),
            )
            .unwrap();
        let mut broker = Recorder::default();

        // S00 falls the most, S09 rises the most
        let mut last = None;
        for day in [2u32, 3] {
            let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
            for (i, security) in names.iter().enumerate() {
                let close = if day == 2 {
                    dec!(100)
                } else {
                    Decimal::from(90 + 2 * i as i64)
                };
                let bar = DailyBar::new(security.clone(), date, close);
                last = Some(engine.on_bar(&bar, &mut broker).unwrap());
            }
        }

        assert!(matches!(last, Some(BarOutcome::Rebalanced { .. })));
        assert_eq!(
            broker.0,
            vec![
                OrderIntent::market("S09", Side::Sell, dec!(500) / dec!(108)),
                OrderIntent::market("S00", Side::Buy, dec!(500) / dec!(90)),
            ]
        );
    }

    #[test]
    fn test_overrides_must_be_object() {
        let registry = PresetRegistry::new();
        let result = registry.config("best_performer", serde_json::json!([1, 2]), universe(2));
        assert!(result.is_err());
    }
}
