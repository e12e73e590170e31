//! Cross-sectional performance ranking.

use rotator_core::error::EngineError;
use rotator_core::types::Security;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::universe::UniverseState;

/// Sign convention of the performance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricConvention {
    /// `(newest - oldest) / oldest`: recent winners rank first
    #[default]
    Momentum,
    /// `(oldest - newest) / oldest`: recent losers rank first
    Reversal,
}

impl MetricConvention {
    /// Metric over a window, `None` if the oldest price is zero or the
    /// return does not fit in a `Decimal`.
    pub fn metric(&self, oldest: Decimal, newest: Decimal) -> Option<Decimal> {
        if oldest.is_zero() {
            return None;
        }
        let change = newest.checked_sub(oldest)?.checked_div(oldest)?;
        Some(match self {
            MetricConvention::Momentum => change,
            MetricConvention::Reversal => -change,
        })
    }
}

/// Metric value for one security at a rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub security: Security,
    pub metric: Decimal,
}

impl PerformanceRecord {
    pub fn new(security: impl Into<Security>, metric: Decimal) -> Self {
        Self {
            security: security.into(),
            metric,
        }
    }
}

/// Computes the per-security metric from a full universe snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceRanker {
    convention: MetricConvention,
}

impl PerformanceRanker {
    pub fn new(convention: MetricConvention) -> Self {
        Self { convention }
    }

    pub fn convention(&self) -> MetricConvention {
        self.convention
    }

    /// One record per security, in universe order.
    ///
    /// Fails with `NotReady` unless every window is full. Securities whose
    /// return is undefined (zero oldest price) or overflows are left out.
    pub fn rank(&self, universe: &UniverseState) -> Result<Vec<PerformanceRecord>, EngineError> {
        if let Some((security, window)) = universe.first_unready() {
            return Err(EngineError::NotReady {
                security: security.clone(),
                required: window.capacity(),
                available: window.len(),
            });
        }

        let mut records = Vec::with_capacity(universe.len());
        for security in universe.securities() {
            let Some(window) = universe.window(security) else {
                continue;
            };
            let (Some(oldest), Some(newest)) = (window.oldest(), window.newest()) else {
                continue;
            };
            match self.convention.metric(oldest, newest) {
                Some(metric) => records.push(PerformanceRecord::new(security.clone(), metric)),
                None => warn!(
                    security = %security,
                    %oldest,
                    %newest,
                    "return undefined, excluded from ranking"
                ),
            }
        }
        Ok(records)
    }
}

/// Stable sort by metric, best first. Ties keep their input order.
pub fn sort_descending(records: &mut [PerformanceRecord]) {
    records.sort_by(|a, b| b.metric.cmp(&a.metric));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn filled_universe(histories: &[(&str, Vec<Decimal>)], lookback: usize) -> UniverseState {
        let securities = histories.iter().map(|(t, _)| Security::new(*t)).collect();
        let mut state = UniverseState::new(securities, lookback).unwrap();
        for (ticker, prices) in histories {
            for price in prices.iter() {
                state.update(&Security::new(*ticker), *price).unwrap();
            }
        }
        state
    }

    #[test]
    fn test_momentum_metric_over_full_window() {
        let state = filled_universe(
            &[
                ("A", vec![dec!(100), dec!(90), dec!(105)]),
                ("B", vec![dec!(50), dec!(55), dec!(45)]),
            ],
            2,
        );

        let records = PerformanceRanker::new(MetricConvention::Momentum)
            .rank(&state)
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], PerformanceRecord::new("A", dec!(0.05)));
        assert_eq!(records[1], PerformanceRecord::new("B", dec!(-0.1)));
    }

    #[test]
    fn test_reversal_flips_sign() {
        let state = filled_universe(&[("A", vec![dec!(100), dec!(110)])], 1);

        let records = PerformanceRanker::new(MetricConvention::Reversal)
            .rank(&state)
            .unwrap();
        assert_eq!(records[0].metric, dec!(-0.1));
    }

    #[test]
    fn test_rank_not_ready() {
        let state = filled_universe(
            &[("A", vec![dec!(1), dec!(2), dec!(3)]), ("B", vec![dec!(1)])],
            2,
        );

        let err = PerformanceRanker::default().rank(&state).unwrap_err();
        match err {
            EngineError::NotReady {
                security,
                required,
                available,
            } => {
                assert_eq!(security, Security::new("B"));
                assert_eq!(required, 3);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_oldest_price_excluded() {
        let state = filled_universe(
            &[("A", vec![dec!(0), dec!(5)]), ("B", vec![dec!(10), dec!(11)])],
            1,
        );

        let records = PerformanceRanker::default().rank(&state).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].security, Security::new("B"));
    }

    #[test]
    fn test_overflowing_return_excluded() {
        let tiny = Decimal::new(1, 28);
        let state = filled_universe(
            &[("A", vec![tiny, dec!(1000000)]), ("B", vec![dec!(10), dec!(12)])],
            1,
        );

        let records = PerformanceRanker::default().rank(&state).unwrap();
        assert_eq!(records, vec![PerformanceRecord::new("B", dec!(0.2))]);
        assert_eq!(MetricConvention::Reversal.metric(tiny, dec!(1000000)), None);
    }

    #[test]
    fn test_sort_descending_is_stable() {
        let mut records = vec![
            PerformanceRecord::new("A", dec!(0.01)),
            PerformanceRecord::new("B", dec!(0.05)),
            PerformanceRecord::new("C", dec!(0.01)),
            PerformanceRecord::new("D", dec!(0.05)),
        ];
        sort_descending(&mut records);

        let order: Vec<_> = records.iter().map(|r| r.security.as_str()).collect();
        assert_eq!(order, vec!["B", "D", "A", "C"]);
    }
}
