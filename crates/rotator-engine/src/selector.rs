//! Bucket selection over a ranked universe.
//!
//! Selection rules implement [`BucketSelector`]; [`SelectionPolicy`] is the
//! serializable form used in configuration. Adding a rule means adding an
//! implementation and a policy variant, the allocator and rebalancer only
//! ever see [`Bucket`]s.

use rotator_core::error::EngineError;
use rotator_core::types::Security;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ranker::{sort_descending, PerformanceRecord};

/// Direction of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketSide {
    Long,
    Short,
}

impl BucketSide {
    /// +1 for long, -1 for short.
    pub fn sign(&self) -> Decimal {
        match self {
            BucketSide::Long => Decimal::ONE,
            BucketSide::Short => -Decimal::ONE,
        }
    }
}

/// A leg of the target portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub side: BucketSide,
    /// Unsigned fraction of portfolio value spread over the members
    pub gross_weight: Decimal,
    pub members: Vec<Security>,
}

impl Bucket {
    pub fn new(side: BucketSide, gross_weight: Decimal, members: Vec<Security>) -> Self {
        Self {
            side,
            gross_weight,
            members,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Why a cycle produced no buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Nothing was ranked
    NoRecords,
    /// Fewer tied best performers than required
    TooFewNames { found: usize, required: usize },
    /// Ranked universe smaller than the configured minimum
    UniverseTooSmall { size: usize, required: usize },
    /// `floor(size / 10)` is zero
    EmptyDecile { size: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoRecords => write!(f, "no ranked securities"),
            SkipReason::TooFewNames { found, required } => {
                write!(f, "{found} best performers, need {required}")
            }
            SkipReason::UniverseTooSmall { size, required } => {
                write!(f, "{size} ranked securities, need {required}")
            }
            SkipReason::EmptyDecile { size } => {
                write!(f, "decile of {size} securities is empty")
            }
        }
    }
}

/// Result of a selection pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Buckets(Vec<Bucket>),
    Skipped(SkipReason),
}

/// A rule turning performance records into buckets.
pub trait BucketSelector: Send + Sync {
    fn name(&self) -> &str;

    /// Select buckets from records given in universe order.
    fn select(&self, records: &[PerformanceRecord]) -> Selection;
}

/// Which end of the ranking is bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegConvention {
    #[default]
    LongWinnersShortLosers,
    LongLosersShortWinners,
}

impl LegConvention {
    /// Sides of the (winners, losers) buckets.
    pub fn sides(&self) -> (BucketSide, BucketSide) {
        match self {
            LegConvention::LongWinnersShortLosers => (BucketSide::Long, BucketSide::Short),
            LegConvention::LongLosersShortWinners => (BucketSide::Short, BucketSide::Long),
        }
    }
}

/// Every security tied at the top metric, one long bucket.
#[derive(Debug, Clone)]
pub struct BestPerformer {
    pub min_names: usize,
    pub gross_weight: Decimal,
}

impl BucketSelector for BestPerformer {
    fn name(&self) -> &str {
        "best_performer"
    }

    fn select(&self, records: &[PerformanceRecord]) -> Selection {
        let Some(best) = records.iter().map(|r| r.metric).max() else {
            return Selection::Skipped(SkipReason::NoRecords);
        };

        let members: Vec<Security> = records
            .iter()
            .filter(|r| r.metric == best)
            .map(|r| r.security.clone())
            .collect();

        if members.len() < self.min_names {
            return Selection::Skipped(SkipReason::TooFewNames {
                found: members.len(),
                required: self.min_names,
            });
        }

        Selection::Buckets(vec![Bucket::new(
            BucketSide::Long,
            self.gross_weight,
            members,
        )])
    }
}

/// Top and bottom deciles traded against each other.
#[derive(Debug, Clone)]
pub struct DecileSplit {
    pub min_universe: usize,
    pub leg_gross_weight: Decimal,
    pub legs: LegConvention,
}

impl DecileSplit {
    /// Members per leg for a ranked universe of `size`.
    pub fn bucket_size(size: usize) -> usize {
        size / 10
    }
}

impl BucketSelector for DecileSplit {
    fn name(&self) -> &str {
        "deciles"
    }

    fn select(&self, records: &[PerformanceRecord]) -> Selection {
        let size = records.len();
        if size == 0 {
            return Selection::Skipped(SkipReason::NoRecords);
        }
        if size < self.min_universe {
            return Selection::Skipped(SkipReason::UniverseTooSmall {
                size,
                required: self.min_universe,
            });
        }
        let k = Self::bucket_size(size);
        if k == 0 {
            return Selection::Skipped(SkipReason::EmptyDecile { size });
        }

        let mut ranked = records.to_vec();
        sort_descending(&mut ranked);

        let winners = ranked[..k].iter().map(|r| r.security.clone()).collect();
        let losers = ranked[size - k..].iter().map(|r| r.security.clone()).collect();
        let (winner_side, loser_side) = self.legs.sides();

        Selection::Buckets(vec![
            Bucket::new(winner_side, self.leg_gross_weight, winners),
            Bucket::new(loser_side, self.leg_gross_weight, losers),
        ])
    }
}

fn default_min_names() -> usize {
    1
}

fn default_gross_weight() -> Decimal {
    Decimal::ONE
}

fn default_leg_gross_weight() -> Decimal {
    dec!(0.5)
}

/// Serializable selection rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionPolicy {
    BestPerformer {
        #[serde(default = "default_min_names")]
        min_names: usize,
        #[serde(default = "default_gross_weight")]
        gross_weight: Decimal,
    },
    Deciles {
        #[serde(default)]
        min_universe: usize,
        #[serde(default = "default_leg_gross_weight")]
        leg_gross_weight: Decimal,
        #[serde(default)]
        legs: LegConvention,
    },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::BestPerformer {
            min_names: default_min_names(),
            gross_weight: default_gross_weight(),
        }
    }
}

impl SelectionPolicy {
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            SelectionPolicy::BestPerformer {
                min_names,
                gross_weight,
            } => {
                if *min_names == 0 {
                    return Err(EngineError::Configuration(
                        "min_names must be at least 1".into(),
                    ));
                }
                check_gross(*gross_weight)
            }
            SelectionPolicy::Deciles {
                leg_gross_weight, ..
            } => check_gross(*leg_gross_weight),
        }
    }

    /// Build the selector implementing this policy.
    pub fn build(&self) -> Box<dyn BucketSelector> {
        match self {
            SelectionPolicy::BestPerformer {
                min_names,
                gross_weight,
            } => Box::new(BestPerformer {
                min_names: *min_names,
                gross_weight: *gross_weight,
            }),
            SelectionPolicy::Deciles {
                min_universe,
                leg_gross_weight,
                legs,
            } => Box::new(DecileSplit {
                min_universe: *min_universe,
                leg_gross_weight: *leg_gross_weight,
                legs: *legs,
            }),
        }
    }
}

fn check_gross(weight: Decimal) -> Result<(), EngineError> {
    if weight <= Decimal::ZERO || weight > Decimal::ONE {
        return Err(EngineError::Configuration(format!(
            "gross weight must be in (0, 1], got {weight}"
        )));
    }
    Ok(())
}
