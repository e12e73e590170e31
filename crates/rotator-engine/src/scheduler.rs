//! Calendar-driven rebalance scheduling.
//!
//! Bars from different securities arrive independently. The scheduler keeps a
//! single clock holding the latest session date seen and decides, at most once
//! per date, whether that date is a rebalance date.

use chrono::{Datelike, NaiveDate, Weekday};
use rotator_core::types::Security;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Which session dates trigger a rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RebalanceRule {
    /// Every session
    Daily,
    /// Sessions falling on the given day of the month
    DayOfMonth { day: u32 },
    /// Sessions falling on the given weekday
    Weekday { weekday: Weekday },
    /// First evaluated session of each calendar month
    #[default]
    MonthStart,
    /// First evaluated session of each ISO week
    WeekStart,
}

impl RebalanceRule {
    /// Check the rule for `date`, given the previously evaluated date.
    pub fn is_due(&self, date: NaiveDate, previous: Option<NaiveDate>) -> bool {
        match *self {
            RebalanceRule::Daily => true,
            RebalanceRule::DayOfMonth { day } => date.day() == day,
            RebalanceRule::Weekday { weekday } => date.weekday() == weekday,
            RebalanceRule::MonthStart => match previous {
                Some(prev) => (prev.year(), prev.month()) != (date.year(), date.month()),
                None => true,
            },
            RebalanceRule::WeekStart => match previous {
                Some(prev) => prev.iso_week() != date.iso_week(),
                None => true,
            },
        }
    }
}

/// When the rule is evaluated for a new date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingMode {
    /// Once every security has delivered that date's bar
    #[default]
    UniverseComplete,
    /// On the first bar of the date from any security
    FirstBar,
}

/// Scheduler state for the current clock date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    /// No bar has advanced the clock yet
    Idle,
    /// A bar already advanced the clock to the current date
    Processed,
}

/// Outcome of feeding one bar to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// Bar is older than the clock
    Stale,
    /// Date not evaluated yet, or already evaluated
    Waiting,
    /// Date evaluated, not a rebalance date
    NotDue,
    /// Date evaluated, rebalance should run now
    Due,
}

/// Decides once per calendar date whether a rebalance should fire.
#[derive(Debug, Clone)]
pub struct RebalanceScheduler {
    rule: RebalanceRule,
    gating: GatingMode,
    universe_size: usize,
    clock: Option<NaiveDate>,
    state: ClockState,
    seen: HashSet<Security>,
    evaluated: bool,
    last_evaluated: Option<NaiveDate>,
}

impl RebalanceScheduler {
    pub fn new(rule: RebalanceRule, gating: GatingMode, universe_size: usize) -> Self {
        Self {
            rule,
            gating,
            universe_size,
            clock: None,
            state: ClockState::Idle,
            seen: HashSet::new(),
            evaluated: false,
            last_evaluated: None,
        }
    }

    /// Observe a finished bar and report whether a rebalance is due.
    pub fn observe(&mut self, security: &Security, date: NaiveDate) -> ScheduleDecision {
        match self.clock {
            Some(clock) if date < clock => {
                debug!(security = %security, %date, %clock, "stale bar ignored by scheduler");
                return ScheduleDecision::Stale;
            }
            Some(clock) if date == clock => {}
            _ => {
                self.clock = Some(date);
                self.state = ClockState::Processed;
                self.seen.clear();
                self.evaluated = false;
            }
        }

        self.seen.insert(security.clone());
        if self.evaluated {
            return ScheduleDecision::Waiting;
        }

        let complete = match self.gating {
            GatingMode::FirstBar => true,
            GatingMode::UniverseComplete => self.seen.len() >= self.universe_size,
        };
        if !complete {
            return ScheduleDecision::Waiting;
        }

        self.evaluated = true;
        let due = self.rule.is_due(date, self.last_evaluated);
        self.last_evaluated = Some(date);

        if due {
            ScheduleDecision::Due
        } else {
            ScheduleDecision::NotDue
        }
    }

    /// Latest date observed.
    pub fn clock(&self) -> Option<NaiveDate> {
        self.clock
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn rule(&self) -> RebalanceRule {
        self.rule
    }

    pub fn gating(&self) -> GatingMode {
        self.gating
    }

    /// Securities that have reported the current clock date.
    pub fn reported(&self) -> usize {
        self.seen.len()
    }

    pub fn reset(&mut self) {
        self.clock = None;
        self.state = ClockState::Idle;
        self.seen.clear();
        self.evaluated = false;
        self.last_evaluated = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sec(t: &str) -> Security {
        Security::new(t)
    }

    #[test]
    fn test_rule_predicates() {
        let mon = date(2024, 4, 1);
        let tue = date(2024, 4, 2);

        assert!(RebalanceRule::DayOfMonth { day: 1 }.is_due(mon, None));
        assert!(!RebalanceRule::DayOfMonth { day: 1 }.is_due(tue, None));
        assert!(RebalanceRule::Weekday { weekday: Weekday::Mon }.is_due(mon, None));
        assert!(!RebalanceRule::Weekday { weekday: Weekday::Mon }.is_due(tue, None));

        assert!(RebalanceRule::MonthStart.is_due(mon, Some(date(2024, 3, 29))));
        assert!(!RebalanceRule::MonthStart.is_due(tue, Some(mon)));
        assert!(RebalanceRule::WeekStart.is_due(date(2024, 4, 8), Some(date(2024, 4, 5))));
        assert!(!RebalanceRule::WeekStart.is_due(tue, Some(mon)));
    }

    #[test]
    fn test_complete_gating_waits_for_all_securities() {
        let mut scheduler = RebalanceScheduler::new(RebalanceRule::Daily, GatingMode::UniverseComplete, 3);
        let d = date(2024, 1, 2);

        assert_eq!(scheduler.state(), ClockState::Idle);
        assert_eq!(scheduler.observe(&sec("A"), d), ScheduleDecision::Waiting);
        assert_eq!(scheduler.state(), ClockState::Processed);
        assert_eq!(scheduler.observe(&sec("B"), d), ScheduleDecision::Waiting);
        // Duplicate bar from A does not complete the set
        assert_eq!(scheduler.observe(&sec("A"), d), ScheduleDecision::Waiting);
        assert_eq!(scheduler.observe(&sec("C"), d), ScheduleDecision::Due);
        assert_eq!(scheduler.observe(&sec("C"), d), ScheduleDecision::Waiting);
    }

    #[test]
    fn test_first_bar_gating_fires_once_per_date() {
        let mut scheduler = RebalanceScheduler::new(RebalanceRule::Daily, GatingMode::FirstBar, 3);
        let d1 = date(2024, 1, 2);
        let d2 = date(2024, 1, 3);

        assert_eq!(scheduler.observe(&sec("A"), d1), ScheduleDecision::Due);
        assert_eq!(scheduler.observe(&sec("B"), d1), ScheduleDecision::Waiting);
        assert_eq!(scheduler.observe(&sec("C"), d1), ScheduleDecision::Waiting);
        assert_eq!(scheduler.observe(&sec("B"), d2), ScheduleDecision::Due);
        assert_eq!(scheduler.clock(), Some(d2));
    }

    #[test]
    fn test_stale_bars_do_not_move_clock() {
        let mut scheduler = RebalanceScheduler::new(RebalanceRule::Daily, GatingMode::FirstBar, 2);
        let d1 = date(2024, 1, 2);
        let d2 = date(2024, 1, 3);

        scheduler.observe(&sec("A"), d2);
        assert_eq!(scheduler.observe(&sec("B"), d1), ScheduleDecision::Stale);
        assert_eq!(scheduler.clock(), Some(d2));
    }

    #[test]
    fn test_not_due_is_reported_once() {
        let mut scheduler = RebalanceScheduler::new(
            RebalanceRule::DayOfMonth { day: 1 },
            GatingMode::UniverseComplete,
            2,
        );
        let d = date(2024, 1, 2);

        assert_eq!(scheduler.observe(&sec("A"), d), ScheduleDecision::Waiting);
        assert_eq!(scheduler.observe(&sec("B"), d), ScheduleDecision::NotDue);
        assert_eq!(scheduler.observe(&sec("A"), d), ScheduleDecision::Waiting);
    }

    #[test]
    fn test_incomplete_date_is_abandoned_when_clock_moves() {
        let mut scheduler = RebalanceScheduler::new(RebalanceRule::Daily, GatingMode::UniverseComplete, 2);

        scheduler.observe(&sec("A"), date(2024, 1, 2));
        // B never reports the 2nd; the 3rd starts a fresh seen-set
        assert_eq!(scheduler.observe(&sec("A"), date(2024, 1, 3)), ScheduleDecision::Waiting);
        assert_eq!(scheduler.reported(), 1);
        assert_eq!(scheduler.observe(&sec("B"), date(2024, 1, 3)), ScheduleDecision::Due);
    }

    #[test]
    fn test_month_start_uses_evaluated_dates() {
        let mut scheduler = RebalanceScheduler::new(RebalanceRule::MonthStart, GatingMode::FirstBar, 1);

        assert_eq!(scheduler.observe(&sec("A"), date(2024, 1, 30)), ScheduleDecision::Due);
        assert_eq!(scheduler.observe(&sec("A"), date(2024, 1, 31)), ScheduleDecision::NotDue);
        // Feb 1st is a holiday in this feed; the 2nd is the first session of the month
        assert_eq!(scheduler.observe(&sec("A"), date(2024, 2, 2)), ScheduleDecision::Due);
        assert_eq!(scheduler.observe(&sec("A"), date(2024, 2, 5)), ScheduleDecision::NotDue);
    }

    #[test]
    fn test_reset() {
        let mut scheduler = RebalanceScheduler::new(RebalanceRule::Daily, GatingMode::FirstBar, 1);
        scheduler.observe(&sec("A"), date(2024, 5, 1));
        scheduler.reset();

        assert_eq!(scheduler.clock(), None);
        assert_eq!(scheduler.state(), ClockState::Idle);
        assert_eq!(scheduler.observe(&sec("A"), date(2024, 4, 1)), ScheduleDecision::Due);
    }
}
