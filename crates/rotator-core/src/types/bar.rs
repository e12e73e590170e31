//! Finished daily bars.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Security;

/// A finished daily bar for one security.
///
/// Feeds only hand over bars whose session has closed; partial bars never
/// reach the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Security the bar belongs to
    pub security: Security,
    /// Session date (no time of day)
    pub date: NaiveDate,
    /// Closing price
    pub close: Decimal,
}

impl DailyBar {
    /// Create a new bar.
    pub fn new(security: impl Into<Security>, date: NaiveDate, close: Decimal) -> Self {
        Self {
            security: security.into(),
            date,
            close,
        }
    }

    /// Day of week of the session.
    #[inline]
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// Day of month of the session.
    #[inline]
    pub fn day_of_month(&self) -> u32 {
        self.date.day()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bar_calendar_accessors() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let bar = DailyBar::new("AAPL", date, dec!(172.50));

        assert_eq!(bar.security, Security::new("AAPL"));
        assert_eq!(bar.weekday(), Weekday::Mon);
        assert_eq!(bar.day_of_month(), 4);
    }
}
