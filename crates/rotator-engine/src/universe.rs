//! Per-security price history for a fixed universe.

use rotator_core::error::EngineError;
use rotator_core::types::Security;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

use crate::window::PriceWindow;

/// Price windows and latest prices for every security in the universe.
///
/// The universe is fixed at construction. Its configured order is kept and
/// used as the canonical iteration order, which makes ranking ties and
/// order emission deterministic.
#[derive(Debug, Clone)]
pub struct UniverseState {
    securities: Vec<Security>,
    windows: HashMap<Security, PriceWindow>,
    latest: HashMap<Security, Decimal>,
    lookback: usize,
}

impl UniverseState {
    /// Create windows of capacity `lookback + 1` for each security.
    pub fn new(securities: Vec<Security>, lookback: usize) -> Result<Self, EngineError> {
        if securities.is_empty() {
            return Err(EngineError::Configuration("universe is empty".into()));
        }
        if lookback == 0 {
            return Err(EngineError::Configuration(
                "lookback must be greater than 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for security in &securities {
            if !seen.insert(security) {
                return Err(EngineError::Configuration(format!(
                    "duplicate security in universe: {security}"
                )));
            }
        }

        let windows = securities
            .iter()
            .map(|s| (s.clone(), PriceWindow::for_lookback(lookback)))
            .collect();

        Ok(Self {
            securities,
            windows,
            latest: HashMap::new(),
            lookback,
        })
    }

    /// Append a closing price and record it as the latest price.
    pub fn update(&mut self, security: &Security, price: Decimal) -> Result<(), EngineError> {
        let window = self
            .windows
            .get_mut(security)
            .ok_or_else(|| EngineError::UnknownSecurity(security.clone()))?;

        if price < Decimal::ZERO {
            return Err(EngineError::InvalidPrice {
                security: security.clone(),
                price,
            });
        }

        window.push(price);
        self.latest.insert(security.clone(), price);
        Ok(())
    }

    /// True only when every window is full.
    pub fn is_ready(&self) -> bool {
        self.windows.values().all(PriceWindow::is_full)
    }

    /// First security (in universe order) whose window is not yet full.
    pub fn first_unready(&self) -> Option<(&Security, &PriceWindow)> {
        self.securities
            .iter()
            .map(|s| (s, &self.windows[s]))
            .find(|(_, w)| !w.is_full())
    }

    pub fn window(&self, security: &Security) -> Option<&PriceWindow> {
        self.windows.get(security)
    }

    /// Latest observed price, if any bar has arrived yet.
    pub fn latest_price(&self, security: &Security) -> Option<Decimal> {
        self.latest.get(security).copied()
    }

    pub fn contains(&self, security: &Security) -> bool {
        self.windows.contains_key(security)
    }

    /// Securities in configured order.
    pub fn securities(&self) -> &[Security] {
        &self.securities
    }

    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Position of a security in the configured order.
    pub fn index_of(&self, security: &Security) -> Option<usize> {
        self.securities.iter().position(|s| s == security)
    }

    /// Clear all windows and latest prices.
    pub fn reset(&mut self) {
        self.windows.values_mut().for_each(PriceWindow::clear);
        self.latest.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn universe(tickers: &[&str]) -> Vec<Security> {
        tickers.iter().map(|t| Security::new(*t)).collect()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        assert!(matches!(
            UniverseState::new(vec![], 5),
            Err(EngineError::Configuration(_))
        ));
        assert!(matches!(
            UniverseState::new(universe(&["A"]), 0),
            Err(EngineError::Configuration(_))
        ));
        assert!(matches!(
            UniverseState::new(universe(&["A", "B", "A"]), 3),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_update_unknown_security() {
        let mut state = UniverseState::new(universe(&["A", "B"]), 2).unwrap();
        let err = state.update(&Security::new("C"), dec!(10)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownSecurity(s) if s.as_str() == "C"));
    }

    #[test]
    fn test_update_rejects_negative_price() {
        let mut state = UniverseState::new(universe(&["A"]), 2).unwrap();
        let err = state.update(&Security::new("A"), dec!(-1)).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(state.window(&Security::new("A")).unwrap().len(), 0);
    }

    #[test]
    fn test_ready_only_when_every_window_full() {
        let a = Security::new("A");
        let b = Security::new("B");
        let mut state = UniverseState::new(vec![a.clone(), b.clone()], 1).unwrap();

        state.update(&a, dec!(10)).unwrap();
        state.update(&a, dec!(11)).unwrap();
        assert!(!state.is_ready());
        assert_eq!(state.first_unready().map(|(s, _)| s), Some(&b));

        state.update(&b, dec!(20)).unwrap();
        state.update(&b, dec!(21)).unwrap();
        assert!(state.is_ready());
        assert!(state.first_unready().is_none());
        assert_eq!(state.latest_price(&a), Some(dec!(11)));
    }

    #[test]
    fn test_reset_clears_history() {
        let a = Security::new("A");
        let mut state = UniverseState::new(vec![a.clone()], 1).unwrap();
        state.update(&a, dec!(1)).unwrap();
        state.update(&a, dec!(2)).unwrap();

        state.reset();
        assert!(!state.is_ready());
        assert_eq!(state.latest_price(&a), None);
        assert!(state.contains(&a));
    }
}
