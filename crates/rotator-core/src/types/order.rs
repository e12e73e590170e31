//! Order types and structures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Security;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Get the sign for position calculations (+1 for buy, -1 for sell).
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => -Decimal::ONE,
        }
    }

    /// Side needed to move a position by `delta` units.
    pub fn for_delta(delta: Decimal) -> Self {
        if delta > Decimal::ZERO {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A market order the engine wants executed.
///
/// Derived fresh on every rebalance and never stored by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Security to trade
    pub security: Security,
    /// Buy or sell
    pub side: Side,
    /// Unsigned volume
    pub volume: Decimal,
}

impl OrderIntent {
    /// Create a market order intent.
    pub fn market(security: impl Into<Security>, side: Side, volume: Decimal) -> Self {
        Self {
            security: security.into(),
            side,
            volume,
        }
    }

    /// Signed volume change this order applies to a position.
    pub fn signed_volume(&self) -> Decimal {
        self.side.sign() * self.volume
    }
}

impl std::fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.side, self.volume, self.security)
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Accepted by the broker, not yet executed
    Accepted,
    /// Completely filled
    Filled,
    /// Rejected by the broker
    Rejected,
}

impl OrderStatus {
    /// Check if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Rejected)
    }
}

/// An order as acknowledged by a broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID
    pub id: Uuid,
    /// Security traded
    pub security: Security,
    /// Buy or sell
    pub side: Side,
    /// Requested volume
    pub volume: Decimal,
    /// Current status
    pub status: OrderStatus,
    /// Execution price once filled
    pub fill_price: Option<Decimal>,
    /// Commission charged
    pub commission: Decimal,
    /// When the order was created
    pub created_at: DateTime<Utc>,
    /// When the order was filled
    pub filled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a new accepted order from an intent.
    pub fn from_intent(intent: &OrderIntent) -> Self {
        Self {
            id: Uuid::new_v4(),
            security: intent.security.clone(),
            side: intent.side,
            volume: intent.volume,
            status: OrderStatus::Accepted,
            fill_price: None,
            commission: Decimal::ZERO,
            created_at: Utc::now(),
            filled_at: None,
        }
    }

    /// Mark the order as completely filled.
    pub fn fill(&mut self, price: Decimal, commission: Decimal) {
        self.fill_price = Some(price);
        self.commission = commission;
        self.status = OrderStatus::Filled;
        self.filled_at = Some(Utc::now());
    }

    /// Check if the order is completely filled.
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Notional value of the fill, if any.
    pub fn value(&self) -> Option<Decimal> {
        self.fill_price.map(|price| price * self.volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_intent_market() {
        let intent = OrderIntent::market("AAPL", Side::Sell, dec!(10));
        assert_eq!(intent.security, Security::new("AAPL"));
        assert_eq!(intent.side, Side::Sell);
        assert_eq!(intent.signed_volume(), dec!(-10));
        assert_eq!(intent.to_string(), "SELL 10 AAPL");
    }

    #[test]
    fn test_side_for_delta() {
        assert_eq!(Side::for_delta(dec!(0.5)), Side::Buy);
        assert_eq!(Side::for_delta(dec!(-3)), Side::Sell);
    }

    #[test]
    fn test_order_fill() {
        let intent = OrderIntent::market("AAPL", Side::Buy, dec!(100));
        let mut order = Order::from_intent(&intent);
        assert_eq!(order.status, OrderStatus::Accepted);
        assert!(order.value().is_none());

        order.fill(dec!(150), dec!(1));
        assert!(order.is_filled());
        assert!(order.status.is_terminal());
        assert_eq!(order.value(), Some(dec!(15000)));
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }
}
