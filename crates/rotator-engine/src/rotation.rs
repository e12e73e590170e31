//! Cross-sectional rotation engine.
//!
//! Wires the universe windows, scheduler, ranker, selector, allocator and
//! rebalancer together behind a single reactive entry point, [`RotationEngine::on_bar`].
//! The engine owns no thread and does no I/O; callers serialize bar delivery.

use chrono::{Datelike, NaiveDate};
use rotator_core::error::EngineError;
use rotator_core::traits::Broker;
use rotator_core::types::{DailyBar, Security};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::allocator::WeightAllocator;
use crate::ranker::{sort_descending, MetricConvention, PerformanceRanker, PerformanceRecord};
use crate::rebalancer::{RebalanceReport, RebalanceSettings, Rebalancer};
use crate::scheduler::{ClockState, GatingMode, RebalanceRule, RebalanceScheduler, ScheduleDecision};
use crate::selector::{BucketSelector, Selection, SelectionPolicy, SkipReason};
use crate::universe::UniverseState;

/// Configuration for the rotation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Securities to rotate across, in canonical order
    #[serde(default)]
    pub universe: Vec<Security>,
    /// Number of returns measured; windows hold `lookback + 1` prices
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    #[serde(default)]
    pub schedule: RebalanceRule,
    #[serde(default)]
    pub gating: GatingMode,
    #[serde(default)]
    pub metric: MetricConvention,
    #[serde(default)]
    pub selection: SelectionPolicy,
    /// Minimum notional for an order to be sent
    #[serde(default)]
    pub min_trade_value: Decimal,
    #[serde(default)]
    pub lot_size: Option<Decimal>,
}

fn default_lookback() -> usize {
    20
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            universe: vec![],
            lookback: default_lookback(),
            schedule: RebalanceRule::default(),
            gating: GatingMode::default(),
            metric: MetricConvention::default(),
            selection: SelectionPolicy::default(),
            min_trade_value: Decimal::ZERO,
            lot_size: None,
        }
    }
}

impl RotationConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.universe.is_empty() {
            return Err(EngineError::Configuration(
                "At least one security required".into(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.universe.iter().find(|s| !seen.insert(*s)) {
            return Err(EngineError::Configuration(format!(
                "Duplicate security in universe: {dup}"
            )));
        }
        if self.lookback == 0 {
            return Err(EngineError::Configuration(
                "Lookback must be greater than 0".into(),
            ));
        }
        if let RebalanceRule::DayOfMonth { day } = self.schedule {
            if !(1..=31).contains(&day) {
                return Err(EngineError::Configuration(format!(
                    "Day of month must be between 1 and 31, got {day}"
                )));
            }
        }
        if self.min_trade_value < Decimal::ZERO {
            return Err(EngineError::Configuration(
                "Minimum trade value cannot be negative".into(),
            ));
        }
        if let Some(lot) = self.lot_size {
            if lot <= Decimal::ZERO {
                return Err(EngineError::Configuration(
                    "Lot size must be positive".into(),
                ));
            }
        }
        self.selection.validate()
    }

    fn rebalance_settings(&self) -> RebalanceSettings {
        RebalanceSettings {
            min_trade_value: self.min_trade_value,
            lot_size: self.lot_size,
        }
    }
}

/// What a single bar caused.
#[derive(Debug, Clone)]
pub enum BarOutcome {
    /// Window updated, no rebalance decision yet for this date
    Updated,
    /// Bar older than the clock; window updated only
    Stale,
    /// Date evaluated, not a rebalance date
    NotDue,
    /// Rebalance due but some window is not full
    NotReady {
        security: Security,
        required: usize,
        available: usize,
    },
    /// Rebalance due but the selection rule declined
    SelectionSkipped(SkipReason),
    /// Rebalance ran to completion
    Rebalanced {
        date: NaiveDate,
        report: RebalanceReport,
    },
}

impl BarOutcome {
    pub fn is_rebalance(&self) -> bool {
        matches!(self, BarOutcome::Rebalanced { .. })
    }

    pub fn report(&self) -> Option<&RebalanceReport> {
        match self {
            BarOutcome::Rebalanced { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Snapshot of engine state for monitoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineState {
    pub selector: String,
    pub bars_processed: usize,
    pub rebalances: usize,
    /// Due dates that ended without orders (not ready or selection skipped)
    pub skipped_cycles: usize,
    pub clock: Option<NaiveDate>,
    pub clock_state: Option<ClockState>,
    pub is_ready: bool,
    /// Held securities in universe order
    pub held: Vec<Security>,
    /// Ranking of the last completed ranking pass, best first
    pub last_ranking: Vec<PerformanceRecord>,
}

/// Momentum/reversal rotation across a fixed universe.
pub struct RotationEngine {
    config: RotationConfig,
    universe: UniverseState,
    scheduler: RebalanceScheduler,
    ranker: PerformanceRanker,
    selector: Box<dyn BucketSelector>,
    allocator: WeightAllocator,
    rebalancer: Rebalancer,
    bars_processed: usize,
    rebalances: usize,
    skipped_cycles: usize,
    last_ranking: Vec<PerformanceRecord>,
}

impl RotationEngine {
    /// Validate the configuration and build the engine.
    pub fn new(config: RotationConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let universe = UniverseState::new(config.universe.clone(), config.lookback)?;
        let scheduler = RebalanceScheduler::new(config.schedule, config.gating, universe.len());
        let selector = config.selection.build();

        info!(
            securities = universe.len(),
            lookback = config.lookback,
            selector = selector.name(),
            schedule = ?config.schedule,
            gating = ?config.gating,
            "rotation engine created"
        );

        Ok(Self {
            ranker: PerformanceRanker::new(config.metric),
            rebalancer: Rebalancer::new(config.rebalance_settings()),
            allocator: WeightAllocator,
            universe,
            scheduler,
            selector,
            config,
            bars_processed: 0,
            rebalances: 0,
            skipped_cycles: 0,
            last_ranking: Vec::new(),
        })
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub fn universe(&self) -> &UniverseState {
        &self.universe
    }

    /// Feed one finished daily bar.
    ///
    /// Errors only on misconfiguration (unknown security, negative price).
    /// Skipped cycles and per-security order failures are reported in the
    /// returned outcome.
    pub fn on_bar(
        &mut self,
        bar: &DailyBar,
        broker: &mut dyn Broker,
    ) -> Result<BarOutcome, EngineError> {
        self.universe.update(&bar.security, bar.close)?;
        self.bars_processed += 1;

        match self.scheduler.observe(&bar.security, bar.date) {
            ScheduleDecision::Stale => Ok(BarOutcome::Stale),
            ScheduleDecision::Waiting => Ok(BarOutcome::Updated),
            ScheduleDecision::NotDue => {
                debug!(date = %bar.date, "not a rebalance date");
                Ok(BarOutcome::NotDue)
            }
            ScheduleDecision::Due => self.rebalance(bar.date, broker),
        }
    }

    fn rebalance(
        &mut self,
        date: NaiveDate,
        broker: &mut dyn Broker,
    ) -> Result<BarOutcome, EngineError> {
        let mut records = match self.ranker.rank(&self.universe) {
            Ok(records) => records,
            Err(EngineError::NotReady {
                security,
                required,
                available,
            }) => {
                info!(
                    %date,
                    security = %security,
                    required,
                    available,
                    "rebalance skipped, universe not ready"
                );
                self.skipped_cycles += 1;
                return Ok(BarOutcome::NotReady {
                    security,
                    required,
                    available,
                });
            }
            Err(e) => return Err(e),
        };

        let selection = self.selector.select(&records);
        sort_descending(&mut records);
        self.last_ranking = records;

        let buckets = match selection {
            Selection::Buckets(buckets) => buckets,
            Selection::Skipped(reason) => {
                warn!(%date, selector = self.selector.name(), "selection skipped: {reason}");
                self.skipped_cycles += 1;
                return Ok(BarOutcome::SelectionSkipped(reason));
            }
        };

        let targets = self.allocator.allocate(&buckets);
        let portfolio_value = broker.portfolio_value();
        info!(
            %date,
            weekday = %date.weekday(),
            buckets = buckets.len(),
            %portfolio_value,
            "rebalance started"
        );

        let report = self
            .rebalancer
            .apply(&targets, &self.universe, portfolio_value, broker);
        self.rebalances += 1;

        info!(
            %date,
            orders = report.orders.len(),
            failures = report.failures.len(),
            skipped = report.skipped.len(),
            held = self.rebalancer.held().len(),
            "rebalance complete"
        );

        Ok(BarOutcome::Rebalanced { date, report })
    }

    pub fn state(&self) -> EngineState {
        let held = self
            .universe
            .securities()
            .iter()
            .filter(|s| self.rebalancer.held().contains(*s))
            .cloned()
            .collect();

        EngineState {
            selector: self.selector.name().to_string(),
            bars_processed: self.bars_processed,
            rebalances: self.rebalances,
            skipped_cycles: self.skipped_cycles,
            clock: self.scheduler.clock(),
            clock_state: Some(self.scheduler.state()),
            is_ready: self.universe.is_ready(),
            held,
            last_ranking: self.last_ranking.clone(),
        }
    }

    /// Clear windows, clock and held set.
    pub fn reset(&mut self) {
        self.universe.reset();
        self.scheduler.reset();
        self.rebalancer.reset();
        self.bars_processed = 0;
        self.rebalances = 0;
        self.skipped_cycles = 0;
        self.last_ranking.clear();
    }
}
