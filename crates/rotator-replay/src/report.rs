//! Replay report generation.

use rotator_core::types::{Order, Portfolio};
use rotator_engine::{EngineState, RotationConfig};
use serde::{Deserialize, Serialize};

use crate::{ReplayConfig, ReplayStats};

/// Complete replay report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Replay configuration used
    pub config: ReplayConfig,
    /// Engine configuration used
    pub engine: RotationConfig,
    /// Statistics
    pub stats: ReplayStats,
    /// Final portfolio state
    pub final_portfolio: Portfolio,
    /// Engine state at the end of the replay
    pub final_state: EngineState,
    /// Every order sent to the paper broker
    pub orders: Vec<Order>,
}

impl ReplayReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                      REPLAY REPORT                         \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("STRATEGY\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Selector:            {}\n",
            self.final_state.selector
        ));
        s.push_str(&format!(
            "  Universe:            {} securities\n",
            self.engine.universe.len()
        ));
        s.push_str(&format!("  Lookback:            {}\n", self.engine.lookback));
        s.push_str(&format!("  Schedule:            {:?}\n", self.engine.schedule));
        s.push('\n');

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Initial Capital:     ${:.2}\n",
            self.stats.initial_capital
        ));
        s.push_str(&format!(
            "  Final Equity:        ${:.2}\n",
            self.stats.final_equity
        ));
        s.push_str(&format!(
            "  Total Return:        {:.2}%\n",
            self.stats.total_return_pct
        ));
        s.push_str(&format!(
            "  Annualized Return:   {:.2}%\n",
            self.stats.annualized_return_pct
        ));
        s.push_str(&format!(
            "  Max Drawdown:        {:.2}%\n",
            self.stats.max_drawdown_pct
        ));
        s.push_str(&format!(
            "  Sharpe Ratio:        {:.2}\n",
            self.stats.sharpe_ratio
        ));
        s.push_str(&format!(
            "  Sortino Ratio:       {:.2}\n",
            self.stats.sortino_ratio
        ));
        s.push('\n');

        s.push_str("REBALANCING\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Rebalances:          {}\n", self.stats.rebalances));
        s.push_str(&format!(
            "  Skipped Cycles:      {}\n",
            self.stats.skipped_cycles
        ));
        s.push_str(&format!(
            "  Orders Submitted:    {}\n",
            self.stats.orders_submitted
        ));
        s.push_str(&format!(
            "  Orders Failed:       {}\n",
            self.stats.orders_failed
        ));
        s.push_str(&format!(
            "  Price Skips:         {}\n",
            self.stats.securities_skipped
        ));
        s.push_str(&format!(
            "  Commission:          ${:.2}\n",
            self.stats.total_commission
        ));
        s.push_str(&format!(
            "  Final Holdings:      {}\n",
            self.final_portfolio.position_count()
        ));
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Bars Processed:      {}\n",
            self.stats.bars_processed
        ));
        s.push_str(&format!("  Stale Bars:          {}\n", self.stats.stale_bars));
        s.push_str(&format!(
            "  Sessions:            {}\n",
            self.stats.equity_curve.len()
        ));
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV (equity curve only).
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("date,equity\n");
        for (date, equity) in &self.stats.equity_curve {
            csv.push_str(&format!("{},{}\n", date, equity));
        }
        csv
    }
}
