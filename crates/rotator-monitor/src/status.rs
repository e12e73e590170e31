//! Engine status rendering.

use rotator_engine::EngineState;
use tracing::info;

/// Render an engine snapshot as a short multi-line status block.
pub fn render_engine_state(state: &EngineState) -> String {
    let clock = state
        .clock
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    let held = if state.held.is_empty() {
        "(flat)".to_string()
    } else {
        state
            .held
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut s = String::new();
    s.push_str(&format!("Engine [{}]\n", state.selector));
    s.push_str(&format!(
        "  clock {}  ready {}  bars {}  rebalances {}  skipped {}\n",
        clock,
        if state.is_ready { "yes" } else { "no" },
        state.bars_processed,
        state.rebalances,
        state.skipped_cycles
    ));
    s.push_str(&format!("  held: {}\n", held));

    if !state.last_ranking.is_empty() {
        s.push_str("  ranking:\n");
        for (rank, record) in state.last_ranking.iter().take(10).enumerate() {
            s.push_str(&format!(
                "    {:>2}. {:<10} {:>10}\n",
                rank + 1,
                record.security.as_str(),
                format!("{:.4}", record.metric)
            ));
        }
        if state.last_ranking.len() > 10 {
            s.push_str(&format!("    ... {} more\n", state.last_ranking.len() - 10));
        }
    }

    s
}

/// Emit the snapshot as one structured log event.
pub fn log_engine_state(state: &EngineState) {
    info!(
        selector = %state.selector,
        clock = ?state.clock,
        ready = state.is_ready,
        bars = state.bars_processed,
        rebalances = state.rebalances,
        skipped = state.skipped_cycles,
        held = state.held.len(),
        "engine state"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rotator_core::types::Security;
    use rotator_engine::PerformanceRecord;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_render_flat_engine() {
        let state = EngineState {
            selector: "deciles".into(),
            ..Default::default()
        };
        let text = render_engine_state(&state);

        assert!(text.contains("Engine [deciles]"));
        assert!(text.contains("clock -"));
        assert!(text.contains("(flat)"));
        assert!(!text.contains("ranking"));
    }

    #[test]
    fn test_render_ranking() {
        let state = EngineState {
            selector: "best_performer".into(),
            clock: NaiveDate::from_ymd_opt(2024, 2, 1),
            is_ready: true,
            held: vec![Security::new("AAPL")],
            last_ranking: (0..12)
                .map(|i| PerformanceRecord::new(format!("S{i}"), dec!(0.01) * Decimal::from(12 - i)))
                .collect(),
            ..Default::default()
        };
        let text = render_engine_state(&state);

        assert!(text.contains("clock 2024-02-01"));
        assert!(text.contains("held: AAPL"));
        assert!(text.contains(" 1. S0"));
        assert!(text.contains("... 2 more"));
    }
}
