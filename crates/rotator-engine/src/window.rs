//! Rolling price window.

use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Fixed-capacity FIFO buffer of closing prices for one security.
#[derive(Debug, Clone)]
pub struct PriceWindow {
    prices: VecDeque<Decimal>,
    capacity: usize,
}

impl PriceWindow {
    /// Create a window holding `lookback + 1` prices.
    pub fn for_lookback(lookback: usize) -> Self {
        Self::with_capacity(lookback + 1)
    }

    /// Create a window holding at most `capacity` prices.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            prices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new price, evicting the oldest if at capacity.
    pub fn push(&mut self, price: Decimal) {
        if self.prices.len() >= self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
    }

    /// Number of prices held.
    #[inline]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `capacity` prices have been observed.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.prices.len() == self.capacity
    }

    /// Oldest price still in the window.
    pub fn oldest(&self) -> Option<Decimal> {
        self.prices.front().copied()
    }

    /// Most recent price.
    pub fn newest(&self) -> Option<Decimal> {
        self.prices.back().copied()
    }

    /// Prices from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Decimal> {
        self.prices.iter()
    }

    pub fn clear(&mut self) {
        self.prices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_window_fills_then_evicts_oldest() {
        let mut window = PriceWindow::for_lookback(2);
        assert_eq!(window.capacity(), 3);

        window.push(dec!(1));
        window.push(dec!(2));
        assert!(!window.is_full());

        window.push(dec!(3));
        assert!(window.is_full());
        assert_eq!(window.oldest(), Some(dec!(1)));

        window.push(dec!(4));
        assert_eq!(window.len(), 3);
        assert_eq!(window.oldest(), Some(dec!(2)));
        assert_eq!(window.newest(), Some(dec!(4)));
        assert_eq!(
            window.iter().copied().collect::<Vec<_>>(),
            vec![dec!(2), dec!(3), dec!(4)]
        );
    }

    #[test]
    fn test_window_clear() {
        let mut window = PriceWindow::for_lookback(1);
        window.push(dec!(10));
        window.push(dec!(11));
        assert!(window.is_full());

        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.newest(), None);
    }
}
