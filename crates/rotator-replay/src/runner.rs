//! Replay runner.

use chrono::NaiveDate;
use rotator_broker::{PaperBroker, PaperBrokerConfig};
use rotator_core::error::RotatorError;
use rotator_core::traits::Broker;
use rotator_data::BarFeed;
use rotator_engine::{BarOutcome, RotationEngine};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::report::ReplayReport;
use crate::statistics::ReplayStats;

/// Replay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Initial capital
    pub initial_capital: Decimal,
    /// Commission per unit
    pub commission: Decimal,
    /// Slippage percentage
    pub slippage_pct: Decimal,
    /// Allow buys beyond available cash. Targets are sized on marked
    /// prices, so slipped fills of a fully invested target exceed cash.
    pub allow_margin: bool,
    /// Capacity of the bar queue between feed and engine
    pub channel_buffer: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            commission: Decimal::ZERO,
            slippage_pct: dec!(0.05),
            allow_margin: true,
            channel_buffer: 1024,
        }
    }
}

impl ReplayConfig {
    fn broker(&self) -> PaperBroker {
        PaperBroker::with_config(
            self.initial_capital,
            PaperBrokerConfig {
                slippage_pct: self.slippage_pct,
                commission_per_unit: self.commission,
                allow_margin: self.allow_margin,
            },
        )
    }
}

/// Drives a rotation engine over a bar feed against a paper broker.
pub struct ReplayRunner {
    config: ReplayConfig,
}

impl ReplayRunner {
    /// Create a new replay runner.
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Run a replay.
    ///
    /// The feed's channel is drained by this task only, so the engine sees
    /// one bar at a time. Equity is recorded at the end of each session.
    pub async fn run(
        &self,
        engine: &mut RotationEngine,
        feed: &mut dyn BarFeed,
    ) -> Result<ReplayReport, RotatorError> {
        let mut broker = self.config.broker();
        let mut stats = ReplayStats::new(self.config.initial_capital);
        let mut session: Option<NaiveDate> = None;

        info!(
            feed = feed.name(),
            securities = engine.universe().len(),
            initial_capital = %self.config.initial_capital,
            "starting replay"
        );

        let mut rx = feed.subscribe(self.config.channel_buffer).await?;

        while let Some(bar) = rx.recv().await {
            match session {
                Some(current) if bar.date > current => {
                    stats.record_equity(current, broker.portfolio_value());
                    session = Some(bar.date);
                }
                None => session = Some(bar.date),
                _ => {}
            }

            broker.mark(&bar.security, bar.close);
            stats.bars_processed += 1;

            match engine.on_bar(&bar, &mut broker)? {
                BarOutcome::Rebalanced { date, report } => {
                    let held = engine
                        .state()
                        .held
                        .iter()
                        .map(|s| s.to_string())
                        .collect();
                    stats.record_rebalance(date, broker.portfolio_value(), &report, held);
                }
                BarOutcome::NotReady { .. } | BarOutcome::SelectionSkipped(_) => {
                    stats.skipped_cycles += 1;
                }
                BarOutcome::Stale => {
                    warn!(security = %bar.security, date = %bar.date, "stale bar in replay");
                    stats.stale_bars += 1;
                }
                BarOutcome::Updated | BarOutcome::NotDue => {
                    debug!(security = %bar.security, date = %bar.date, "bar processed");
                }
            }
        }

        if let Some(current) = session {
            stats.record_equity(current, broker.portfolio_value());
        }
        stats.finalize(broker.portfolio());

        info!(
            sessions = stats.equity_curve.len(),
            rebalances = stats.rebalances,
            orders = stats.orders_submitted,
            failures = stats.orders_failed,
            final_equity = %stats.final_equity,
            "replay complete"
        );

        Ok(ReplayReport {
            config: self.config.clone(),
            engine: engine.config().clone(),
            stats,
            final_portfolio: broker.portfolio().clone(),
            final_state: engine.state(),
            orders: broker.orders().to_vec(),
        })
    }
}
