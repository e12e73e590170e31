//! Broker trait definition.

use crate::error::BrokerError;
use crate::types::{Order, OrderIntent, Security};
use rust_decimal::Decimal;

/// Trait for the execution and portfolio side of the host.
///
/// The engine pulls positions and portfolio value on demand instead of
/// accumulating them from fills, so the broker is always the source of
/// truth. Calls are synchronous; `submit_market_order` only has to accept
/// the order, fills are the broker's business.
pub trait Broker {
    /// Signed volume currently held in a security, zero when flat.
    fn position_volume(&self, security: &Security) -> Decimal;

    /// Total portfolio value used as the 100% reference for target weights.
    fn portfolio_value(&self) -> Decimal;

    /// Submit a market order.
    ///
    /// # Returns
    /// The order as acknowledged by the broker, or the reason it was refused
    fn submit_market_order(&mut self, intent: &OrderIntent) -> Result<Order, BrokerError>;

    /// Get the broker name.
    fn name(&self) -> &str;
}
