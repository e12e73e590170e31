//! Position and portfolio types.

use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Security, Side};

/// A position in a single security.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Security held
    pub security: Security,
    /// Volume held (positive for long, negative for short)
    pub volume: Decimal,
    /// Average entry price
    pub avg_entry_price: Decimal,
    /// Last marked price
    pub current_price: Decimal,
    /// Market value (volume * current_price)
    pub market_value: Decimal,
    /// Realized profit/loss from closed portions
    pub realized_pnl: Decimal,
}

impl Position {
    /// Create a new position.
    pub fn new(security: impl Into<Security>, volume: Decimal, avg_entry_price: Decimal) -> Self {
        Self {
            security: security.into(),
            volume,
            avg_entry_price,
            current_price: avg_entry_price,
            market_value: volume * avg_entry_price,
            realized_pnl: Decimal::ZERO,
        }
    }

    /// Check if this is a long position.
    pub fn is_long(&self) -> bool {
        self.volume > Decimal::ZERO
    }

    /// Check if this is a short position.
    pub fn is_short(&self) -> bool {
        self.volume < Decimal::ZERO
    }

    /// Check if the position is flat.
    pub fn is_flat(&self) -> bool {
        self.volume == Decimal::ZERO
    }

    /// Unrealized profit/loss at the last marked price.
    pub fn unrealized_pnl(&self) -> Decimal {
        self.volume * (self.current_price - self.avg_entry_price)
    }

    /// Mark the position to a new price.
    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.market_value = self.volume * price;
    }

    /// Apply a fill to the position.
    /// Returns the realized P&L if the position is being reduced.
    pub fn apply_fill(&mut self, side: Side, volume: Decimal, price: Decimal) -> Decimal {
        let fill = side.sign() * volume;
        let mut realized = Decimal::ZERO;

        let same_direction = (self.volume > Decimal::ZERO && fill > Decimal::ZERO)
            || (self.volume < Decimal::ZERO && fill < Decimal::ZERO);

        if same_direction || self.is_flat() {
            let total_cost = self.volume * self.avg_entry_price + fill * price;
            let new_volume = self.volume + fill;
            if new_volume != Decimal::ZERO {
                self.avg_entry_price = total_cost / new_volume;
            }
            self.volume = new_volume;
        } else {
            // Reducing, closing or reversing
            let close_volume = fill.abs().min(self.volume.abs());
            realized = if self.is_long() {
                close_volume * (price - self.avg_entry_price)
            } else {
                close_volume * (self.avg_entry_price - price)
            };
            self.realized_pnl += realized;

            let remaining = fill.abs() - close_volume;
            if remaining > Decimal::ZERO {
                self.volume = fill.signum() * remaining;
                self.avg_entry_price = price;
            } else {
                self.volume += fill;
            }
        }

        self.update_price(price);
        realized
    }
}

/// Portfolio containing cash and positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    /// Available cash (short sale proceeds included)
    pub cash: Decimal,
    /// Total equity (cash + market value of positions)
    pub equity: Decimal,
    /// Positions by security
    pub positions: HashMap<Security, Position>,
    /// Total realized P&L across all positions
    pub total_realized_pnl: Decimal,
    /// Total commission paid
    pub total_commission: Decimal,
    /// Initial capital (for calculating returns)
    pub initial_capital: Decimal,
    /// Highest equity reached (for drawdown calculation)
    pub peak_equity: Decimal,
}

impl Portfolio {
    /// Create a new portfolio with initial cash.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            cash: initial_capital,
            equity: initial_capital,
            positions: HashMap::new(),
            total_realized_pnl: Decimal::ZERO,
            total_commission: Decimal::ZERO,
            initial_capital,
            peak_equity: initial_capital,
        }
    }

    /// Get a position by security.
    pub fn get_position(&self, security: &Security) -> Option<&Position> {
        self.positions.get(security)
    }

    /// Signed volume held in a security, zero when flat.
    pub fn volume_of(&self, security: &Security) -> Decimal {
        self.positions
            .get(security)
            .map(|p| p.volume)
            .unwrap_or(Decimal::ZERO)
    }

    /// Gross exposure (sum of absolute market values).
    pub fn gross_exposure(&self) -> Decimal {
        self.positions.values().map(|p| p.market_value.abs()).sum()
    }

    /// Recalculate equity and the peak.
    pub fn update_equity(&mut self) {
        let market_value: Decimal = self.positions.values().map(|p| p.market_value).sum();
        self.equity = self.cash + market_value;
        if self.equity > self.peak_equity {
            self.peak_equity = self.equity;
        }
    }

    /// Book a fill: move cash, update or open the position, drop it when flat.
    pub fn apply_fill(&mut self, security: &Security, side: Side, volume: Decimal, price: Decimal, commission: Decimal) {
        let fill_value = price * volume;
        match side {
            Side::Buy => self.cash -= fill_value + commission,
            Side::Sell => self.cash += fill_value - commission,
        }
        self.total_commission += commission;

        let position = self
            .positions
            .entry(security.clone())
            .or_insert_with(|| Position::new(security.clone(), Decimal::ZERO, Decimal::ZERO));
        self.total_realized_pnl += position.apply_fill(side, volume, price);

        if position.is_flat() {
            self.positions.remove(security);
        }

        self.update_equity();
    }

    /// Mark every position to the given prices.
    pub fn update_prices(&mut self, prices: &HashMap<Security, Decimal>) {
        for (security, position) in self.positions.iter_mut() {
            if let Some(&price) = prices.get(security) {
                position.update_price(price);
            }
        }
        self.update_equity();
    }

    /// Calculate current drawdown from peak, in percent.
    pub fn drawdown(&self) -> Decimal {
        if self.peak_equity == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.peak_equity - self.equity) / self.peak_equity * Decimal::from(100)
    }

    /// Calculate total return, in percent.
    pub fn total_return(&self) -> Decimal {
        if self.initial_capital == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.equity - self.initial_capital) / self.initial_capital * Decimal::from(100)
    }

    /// Get the number of open positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}
