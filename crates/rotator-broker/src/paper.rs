//! Paper broker for replays and simulation.

use rotator_core::error::BrokerError;
use rotator_core::traits::Broker;
use rotator_core::types::{Order, OrderIntent, OrderStatus, Portfolio, Security, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Fill model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperBrokerConfig {
    /// Slippage in percent of the marked price, against the order
    pub slippage_pct: Decimal,
    /// Commission per unit traded
    pub commission_per_unit: Decimal,
    /// Allow buys beyond available cash
    pub allow_margin: bool,
}

impl Default for PaperBrokerConfig {
    fn default() -> Self {
        Self {
            slippage_pct: dec!(0.05),
            commission_per_unit: Decimal::ZERO,
            allow_margin: false,
        }
    }
}

/// Fills market orders immediately at the last marked price.
///
/// Prices are marked by the host before orders for a session are sent;
/// a security that was never marked cannot be traded.
pub struct PaperBroker {
    portfolio: Portfolio,
    marks: HashMap<Security, Decimal>,
    orders: Vec<Order>,
    config: PaperBrokerConfig,
}

impl PaperBroker {
    /// Create a new paper broker with initial capital.
    pub fn new(initial_capital: Decimal) -> Self {
        Self::with_config(initial_capital, PaperBrokerConfig::default())
    }

    pub fn with_config(initial_capital: Decimal, config: PaperBrokerConfig) -> Self {
        Self {
            portfolio: Portfolio::new(initial_capital),
            marks: HashMap::new(),
            orders: Vec::new(),
            config,
        }
    }

    /// Set slippage percentage.
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.config.slippage_pct = slippage_pct;
        self
    }

    /// Set commission per unit.
    pub fn with_commission(mut self, commission: Decimal) -> Self {
        self.config.commission_per_unit = commission;
        self
    }

    pub fn with_margin(mut self, allow_margin: bool) -> Self {
        self.config.allow_margin = allow_margin;
        self
    }

    /// Mark one security and revalue the portfolio.
    pub fn mark(&mut self, security: &Security, price: Decimal) {
        self.marks.insert(security.clone(), price);
        if let Some(position) = self.portfolio.positions.get_mut(security) {
            position.update_price(price);
        }
        self.portfolio.update_equity();
    }

    /// Mark several securities at once.
    pub fn mark_prices(&mut self, prices: &HashMap<Security, Decimal>) {
        self.marks
            .extend(prices.iter().map(|(s, p)| (s.clone(), *p)));
        self.portfolio.update_prices(prices);
    }

    pub fn last_price(&self, security: &Security) -> Option<Decimal> {
        self.marks.get(security).copied()
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Every order submitted, filled or rejected, in submission order.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn config(&self) -> &PaperBrokerConfig {
        &self.config
    }

    fn fill_price(&self, side: Side, market_price: Decimal) -> Decimal {
        let slip = self.config.slippage_pct / dec!(100);
        match side {
            Side::Buy => market_price * (Decimal::ONE + slip),
            Side::Sell => market_price * (Decimal::ONE - slip),
        }
    }

    fn execute(&mut self, intent: &OrderIntent) -> Result<(Decimal, Decimal), BrokerError> {
        if intent.volume <= Decimal::ZERO {
            return Err(BrokerError::InvalidVolume(intent.volume));
        }
        let market_price = self
            .marks
            .get(&intent.security)
            .copied()
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| BrokerError::NoMarketPrice(intent.security.clone()))?;

        let fill_price = self.fill_price(intent.side, market_price);
        let commission = self.config.commission_per_unit * intent.volume;

        if intent.side == Side::Buy && !self.config.allow_margin {
            let cost = fill_price * intent.volume + commission;
            if cost > self.portfolio.cash {
                return Err(BrokerError::InsufficientFunds {
                    required: cost,
                    available: self.portfolio.cash,
                });
            }
        }

        Ok((fill_price, commission))
    }
}

impl Broker for PaperBroker {
    fn position_volume(&self, security: &Security) -> Decimal {
        self.portfolio.volume_of(security)
    }

    fn portfolio_value(&self) -> Decimal {
        self.portfolio.equity
    }

    fn submit_market_order(&mut self, intent: &OrderIntent) -> Result<Order, BrokerError> {
        let mut order = Order::from_intent(intent);

        match self.execute(intent) {
            Ok((fill_price, commission)) => {
                self.portfolio
                    .apply_fill(&intent.security, intent.side, intent.volume, fill_price, commission);
                order.fill(fill_price, commission);
                debug!(
                    order_id = %order.id,
                    security = %intent.security,
                    side = %intent.side,
                    volume = %intent.volume,
                    price = %fill_price,
                    "paper fill"
                );
                self.orders.push(order.clone());
                Ok(order)
            }
            Err(e) => {
                warn!(security = %intent.security, "paper order rejected: {e}");
                order.status = OrderStatus::Rejected;
                self.orders.push(order);
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "Paper Broker"
    }
}
