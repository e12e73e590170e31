//! Bar feeds delivering finished daily bars to a single consumer.

use async_trait::async_trait;
use chrono::NaiveDate;
use rotator_core::error::DataError;
use rotator_core::types::{DailyBar, Security};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A source of finished daily bars.
///
/// The receiver returned by [`BarFeed::subscribe`] is the single-writer
/// queue in front of the engine: whatever threads produce bars, the engine
/// sees them one at a time from one consumer.
#[async_trait]
pub trait BarFeed: Send {
    fn name(&self) -> &str;

    /// Start delivering bars into a bounded channel.
    async fn subscribe(&mut self, buffer: usize) -> Result<mpsc::Receiver<DailyBar>, DataError>;
}

/// Replays stored histories in session order.
///
/// Bars are merged by date and, within a date, by universe order.
#[derive(Debug, Clone)]
pub struct ReplayFeed {
    bars: Vec<DailyBar>,
    universe_len: usize,
}

impl ReplayFeed {
    /// Merge per-security histories.
    ///
    /// Histories for securities outside `universe` are rejected; securities
    /// without a history are reported as missing.
    pub fn new(
        universe: &[Security],
        mut histories: HashMap<Security, Vec<DailyBar>>,
    ) -> Result<Self, DataError> {
        if let Some(extra) = histories.keys().find(|s| !universe.contains(s)) {
            return Err(DataError::SymbolNotFound(extra.clone()));
        }

        let mut bars = Vec::new();
        for (rank, security) in universe.iter().enumerate() {
            let history = histories
                .remove(security)
                .ok_or_else(|| DataError::SymbolNotFound(security.clone()))?;
            if history.is_empty() {
                warn!(security = %security, "empty history");
            }
            bars.extend(history.into_iter().map(|bar| (rank, bar)));
        }
        bars.sort_by(|(ra, a), (rb, b)| a.date.cmp(&b.date).then(ra.cmp(rb)));

        Ok(Self {
            bars: bars.into_iter().map(|(_, bar)| bar).collect(),
            universe_len: universe.len(),
        })
    }

    /// Keep only bars within `[start, end]`.
    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.bars.retain(|b| {
            start.map_or(true, |s| b.date >= s) && end.map_or(true, |e| b.date <= e)
        });
        self
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// First and last session dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.bars.first()?.date, self.bars.last()?.date))
    }
}

#[async_trait]
impl BarFeed for ReplayFeed {
    fn name(&self) -> &str {
        "replay"
    }

    async fn subscribe(&mut self, buffer: usize) -> Result<mpsc::Receiver<DailyBar>, DataError> {
        if self.bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        let (tx, rx) = mpsc::channel(buffer.max(1));
        let bars = self.bars.clone();
        info!(
            bars = bars.len(),
            securities = self.universe_len,
            "starting replay feed"
        );

        tokio::spawn(async move {
            for bar in bars {
                if tx.send(bar).await.is_err() {
                    debug!("replay consumer dropped, stopping feed");
                    return;
                }
            }
            debug!("replay feed exhausted");
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn history(ticker: &str, days: &[u32]) -> (Security, Vec<DailyBar>) {
        let bars = days
            .iter()
            .map(|d| DailyBar::new(ticker, date(*d), dec!(10)))
            .collect();
        (Security::new(ticker), bars)
    }

    fn universe(tickers: &[&str]) -> Vec<Security> {
        tickers.iter().map(|t| Security::new(*t)).collect()
    }

    #[test]
    fn test_merge_order() {
        let histories = HashMap::from([history("B", &[2, 3]), history("A", &[3, 4])]);
        let feed = ReplayFeed::new(&universe(&["A", "B"]), histories).unwrap();

        let order: Vec<_> = feed
            .bars()
            .iter()
            .map(|b| (b.security.as_str(), b.date))
            .collect();
        assert_eq!(
            order,
            vec![("B", date(2)), ("A", date(3)), ("B", date(3)), ("A", date(4))]
        );
        assert_eq!(feed.date_range(), Some((date(2), date(4))));
    }

    #[test]
    fn test_missing_and_extra_histories() {
        let histories = HashMap::from([history("A", &[2])]);
        assert!(matches!(
            ReplayFeed::new(&universe(&["A", "B"]), histories),
            Err(DataError::SymbolNotFound(s)) if s.as_str() == "B"
        ));

        let histories = HashMap::from([history("A", &[2]), history("Z", &[2])]);
        assert!(ReplayFeed::new(&universe(&["A"]), histories).is_err());
    }

    #[test]
    fn test_with_range() {
        let histories = HashMap::from([history("A", &[1, 2, 3, 4, 5])]);
        let feed = ReplayFeed::new(&universe(&["A"]), histories)
            .unwrap()
            .with_range(Some(date(2)), Some(date(4)));
        assert_eq!(feed.len(), 3);
    }

    #[tokio::test]
    async fn test_subscribe_streams_all_bars() {
        let histories = HashMap::from([history("A", &[2, 3]), history("B", &[2, 3])]);
        let mut feed = ReplayFeed::new(&universe(&["A", "B"]), histories).unwrap();

        let mut rx = feed.subscribe(1).await.unwrap();
        let mut received = Vec::new();
        while let Some(bar) = rx.recv().await {
            received.push(bar);
        }

        assert_eq!(received.len(), 4);
        assert_eq!(received.as_slice(), feed.bars());
    }

    #[tokio::test]
    async fn test_subscribe_empty_feed() {
        let histories = HashMap::from([history("A", &[])]);
        let mut feed = ReplayFeed::new(&universe(&["A"]), histories).unwrap();
        assert!(feed.subscribe(8).await.is_err());
    }
}
