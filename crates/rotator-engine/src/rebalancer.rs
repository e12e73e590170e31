//! Target-weight diffing and order emission.

use rotator_core::error::EngineError;
use rotator_core::traits::Broker;
use rotator_core::types::{OrderIntent, Security, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::allocator::{weight_of, TargetWeight};
use crate::universe::UniverseState;

/// Order sizing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebalanceSettings {
    /// Smallest notional change worth trading
    pub min_trade_value: Decimal,
    /// Target volumes are truncated toward zero to a multiple of this
    pub lot_size: Option<Decimal>,
}

impl Default for RebalanceSettings {
    fn default() -> Self {
        Self {
            min_trade_value: Decimal::ZERO,
            lot_size: None,
        }
    }
}

/// An order the broker refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFailure {
    pub intent: OrderIntent,
    pub reason: String,
}

/// Orders computed for one rebalance, before submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebalancePlan {
    /// Orders to submit, sells first
    pub orders: Vec<OrderIntent>,
    /// Deltas below the minimum trade value
    pub suppressed: Vec<Security>,
    /// Securities without a usable price
    pub skipped: Vec<Security>,
}

/// What a rebalance did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebalanceReport {
    pub targets: Vec<TargetWeight>,
    /// Orders accepted by the broker
    pub orders: Vec<OrderIntent>,
    pub suppressed: Vec<Security>,
    pub skipped: Vec<Security>,
    pub failures: Vec<OrderFailure>,
}

impl RebalanceReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failures.is_empty()
    }
}

/// Moves the portfolio from its current holdings to target weights.
#[derive(Debug, Clone, Default)]
pub struct Rebalancer {
    settings: RebalanceSettings,
    held: HashSet<Security>,
}

impl Rebalancer {
    pub fn new(settings: RebalanceSettings) -> Self {
        Self {
            settings,
            held: HashSet::new(),
        }
    }

    /// Start from a known held set.
    pub fn with_held(mut self, held: impl IntoIterator<Item = Security>) -> Self {
        self.held = held.into_iter().collect();
        self
    }

    pub fn settings(&self) -> &RebalanceSettings {
        &self.settings
    }

    /// Securities with nonzero target weight after the last rebalance.
    pub fn held(&self) -> &HashSet<Security> {
        &self.held
    }

    /// Compute the orders for `targets` without submitting anything.
    ///
    /// The security set is every nonzero target plus everything currently
    /// held, so names leaving the selection are driven to zero.
    pub fn plan(
        &self,
        targets: &[TargetWeight],
        universe: &UniverseState,
        portfolio_value: Decimal,
        broker: &dyn Broker,
    ) -> RebalancePlan {
        let wanted: HashSet<&Security> = targets
            .iter()
            .filter(|t| !t.weight.is_zero())
            .map(|t| &t.security)
            .chain(self.held.iter())
            .collect();

        let mut plan = RebalancePlan::default();
        for security in universe.securities().iter().filter(|s| wanted.contains(s)) {
            let sized = universe
                .latest_price(security)
                .filter(|price| *price > Decimal::ZERO)
                .and_then(|price| {
                    let current_volume = broker.position_volume(security);
                    self.size(weight_of(targets, security), portfolio_value, price, current_volume)
                        .map(|(delta, notional)| (price, delta, notional))
                });
            let Some((price, delta, notional)) = sized else {
                let err = EngineError::PriceUnavailable {
                    security: security.clone(),
                };
                warn!(security = %security, "{err}, skipping");
                plan.skipped.push(security.clone());
                continue;
            };

            if delta.is_zero() || notional < self.settings.min_trade_value {
                debug!(
                    security = %security,
                    %delta,
                    %price,
                    "delta below minimum trade value, suppressed"
                );
                plan.suppressed.push(security.clone());
                continue;
            }

            plan.orders.push(OrderIntent::market(
                security.clone(),
                Side::for_delta(delta),
                delta.abs(),
            ));
        }

        // Exits and reductions go first so released cash is available to buys
        plan.orders.sort_by_key(|o| o.side == Side::Buy);
        plan
    }

    /// Plan, submit every order independently and replace the held set.
    pub fn apply(
        &mut self,
        targets: &[TargetWeight],
        universe: &UniverseState,
        portfolio_value: Decimal,
        broker: &mut dyn Broker,
    ) -> RebalanceReport {
        let plan = self.plan(targets, universe, portfolio_value, &*broker);
        info!(
            targets = targets.len(),
            orders = plan.orders.len(),
            suppressed = plan.suppressed.len(),
            skipped = plan.skipped.len(),
            %portfolio_value,
            broker = broker.name(),
            "rebalancing"
        );

        let mut report = RebalanceReport {
            targets: targets.to_vec(),
            suppressed: plan.suppressed,
            skipped: plan.skipped,
            ..Default::default()
        };

        for intent in plan.orders {
            match broker.submit_market_order(&intent) {
                Ok(order) => {
                    debug!(order_id = %order.id, "submitted {intent}");
                    report.orders.push(intent);
                }
                Err(source) => {
                    let err = EngineError::OrderSubmission {
                        security: intent.security.clone(),
                        source,
                    };
                    error!(security = %intent.security, "{err}");
                    report.failures.push(OrderFailure {
                        intent,
                        reason: err.to_string(),
                    });
                }
            }
        }

        self.held = targets
            .iter()
            .filter(|t| !t.weight.is_zero())
            .map(|t| t.security.clone())
            .collect();

        report
    }

    /// Volume delta toward the target and its notional at `price`.
    ///
    /// `None` when any step overflows, e.g. a near-zero price against a
    /// large portfolio value.
    fn size(
        &self,
        weight: Decimal,
        portfolio_value: Decimal,
        price: Decimal,
        current_volume: Decimal,
    ) -> Option<(Decimal, Decimal)> {
        let target_value = weight.checked_mul(portfolio_value)?;
        let target_volume = self.round_to_lot(target_value.checked_div(price)?)?;
        let delta = target_volume.checked_sub(current_volume)?;
        let notional = delta.abs().checked_mul(price)?;
        Some((delta, notional))
    }

    fn round_to_lot(&self, volume: Decimal) -> Option<Decimal> {
        match self.settings.lot_size {
            Some(lot) if lot > Decimal::ZERO => volume.checked_div(lot)?.trunc().checked_mul(lot),
            _ => Some(volume),
        }
    }

    pub fn reset(&mut self) {
        self.held.clear();
    }
}
