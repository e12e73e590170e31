//! Replay statistics.

use chrono::NaiveDate;
use rotator_core::types::Portfolio;
use rotator_engine::RebalanceReport;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Summary of one executed rebalance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceRecord {
    pub date: NaiveDate,
    pub equity: Decimal,
    pub targets: usize,
    pub orders: usize,
    pub suppressed: usize,
    pub skipped: usize,
    pub failures: usize,
    /// Held securities after the rebalance
    pub held: Vec<String>,
}

/// Replay statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayStats {
    /// Initial capital
    pub initial_capital: Decimal,
    /// Final equity
    pub final_equity: Decimal,
    /// Total return percentage
    pub total_return_pct: Decimal,
    /// Annualized return percentage
    pub annualized_return_pct: Decimal,
    /// Maximum drawdown percentage
    pub max_drawdown_pct: Decimal,
    /// Sharpe ratio on session returns (risk-free rate of 0)
    pub sharpe_ratio: f64,
    /// Sortino ratio
    pub sortino_ratio: f64,
    /// Bars fed to the engine
    pub bars_processed: usize,
    /// Stale bars seen
    pub stale_bars: usize,
    /// Rebalances executed
    pub rebalances: usize,
    /// Due dates skipped (not ready or selection declined)
    pub skipped_cycles: usize,
    /// Orders accepted by the broker
    pub orders_submitted: usize,
    /// Orders the broker refused
    pub orders_failed: usize,
    /// Per-security price skips during rebalances
    pub securities_skipped: usize,
    /// Total commission paid
    pub total_commission: Decimal,
    /// Equity at the close of each session
    pub equity_curve: Vec<(NaiveDate, Decimal)>,
    /// Every executed rebalance
    pub rebalance_log: Vec<RebalanceRecord>,
    /// Peak equity (for drawdown)
    peak_equity: Decimal,
    /// Session returns for Sharpe calculation
    session_returns: Vec<f64>,
}

impl ReplayStats {
    /// Create new stats tracker.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            final_equity: initial_capital,
            total_return_pct: Decimal::ZERO,
            annualized_return_pct: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            bars_processed: 0,
            stale_bars: 0,
            rebalances: 0,
            skipped_cycles: 0,
            orders_submitted: 0,
            orders_failed: 0,
            securities_skipped: 0,
            total_commission: Decimal::ZERO,
            equity_curve: Vec::new(),
            rebalance_log: Vec::new(),
            peak_equity: initial_capital,
            session_returns: Vec::new(),
        }
    }

    /// Record equity at the close of a session.
    pub fn record_equity(&mut self, date: NaiveDate, equity: Decimal) {
        if let Some((_, prev_equity)) = self.equity_curve.last() {
            if *prev_equity > Decimal::ZERO {
                let ret = ((equity - *prev_equity) / *prev_equity)
                    .to_f64()
                    .unwrap_or(0.0);
                self.session_returns.push(ret);
            }
        }

        self.equity_curve.push((date, equity));

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }

        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }
    }

    /// Record an executed rebalance.
    pub fn record_rebalance(
        &mut self,
        date: NaiveDate,
        equity: Decimal,
        report: &RebalanceReport,
        held: Vec<String>,
    ) {
        self.rebalances += 1;
        self.orders_submitted += report.orders.len();
        self.orders_failed += report.failures.len();
        self.securities_skipped += report.skipped.len();
        self.rebalance_log.push(RebalanceRecord {
            date,
            equity,
            targets: report.targets.len(),
            orders: report.orders.len(),
            suppressed: report.suppressed.len(),
            skipped: report.skipped.len(),
            failures: report.failures.len(),
            held,
        });
    }

    /// Calculate final statistics.
    pub fn finalize(&mut self, portfolio: &Portfolio) {
        self.final_equity = portfolio.equity;
        self.total_commission = portfolio.total_commission;

        if self.initial_capital > Decimal::ZERO {
            self.total_return_pct =
                (self.final_equity - self.initial_capital) / self.initial_capital * dec!(100);
        }

        // Annualized over trading sessions
        if !self.equity_curve.is_empty() {
            let sessions = self.equity_curve.len() as f64;
            let total_return = self.total_return_pct.to_f64().unwrap_or(0.0) / 100.0;
            let annualized = ((1.0 + total_return).powf(252.0 / sessions) - 1.0) * 100.0;
            self.annualized_return_pct = Decimal::try_from(annualized).unwrap_or(Decimal::ZERO);
        }

        if !self.session_returns.is_empty() {
            let n = self.session_returns.len() as f64;
            let mean: f64 = self.session_returns.iter().sum::<f64>() / n;
            let variance: f64 = self
                .session_returns
                .iter()
                .map(|r| (r - mean).powi(2))
                .sum::<f64>()
                / n;
            let std_dev = variance.sqrt();

            if std_dev > 0.0 {
                self.sharpe_ratio = (mean * 252.0_f64.sqrt()) / std_dev;
            }

            let negative_returns: Vec<f64> = self
                .session_returns
                .iter()
                .filter(|&&r| r < 0.0)
                .copied()
                .collect();

            if !negative_returns.is_empty() {
                let downside_variance: f64 =
                    negative_returns.iter().map(|r| r.powi(2)).sum::<f64>()
                        / negative_returns.len() as f64;
                let downside_dev = downside_variance.sqrt();

                if downside_dev > 0.0 {
                    self.sortino_ratio = (mean * 252.0_f64.sqrt()) / downside_dev;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_drawdown_tracks_peak() {
        let mut stats = ReplayStats::new(dec!(1000));
        stats.record_equity(date(1), dec!(1000));
        stats.record_equity(date(2), dec!(1200));
        stats.record_equity(date(3), dec!(900));
        stats.record_equity(date(6), dec!(1100));

        assert_eq!(stats.max_drawdown_pct, dec!(25));
        assert_eq!(stats.equity_curve.len(), 4);
    }

    #[test]
    fn test_finalize_returns() {
        let mut stats = ReplayStats::new(dec!(1000));
        stats.record_equity(date(1), dec!(1000));
        stats.record_equity(date(2), dec!(1010));
        stats.record_equity(date(3), dec!(1005));

        let mut portfolio = Portfolio::new(dec!(1000));
        portfolio.cash = dec!(1005);
        portfolio.update_equity();
        stats.finalize(&portfolio);

        assert_eq!(stats.final_equity, dec!(1005));
        assert_eq!(stats.total_return_pct, dec!(0.5));
        assert!(stats.sharpe_ratio > 0.0);
        assert!(stats.sortino_ratio > 0.0);
    }

    #[test]
    fn test_record_rebalance_counts() {
        let mut stats = ReplayStats::new(dec!(1000));
        let report = RebalanceReport::default();
        stats.record_rebalance(date(1), dec!(1000), &report, vec!["A".into()]);

        assert_eq!(stats.rebalances, 1);
        assert_eq!(stats.rebalance_log[0].held, vec!["A".to_string()]);
    }
}
