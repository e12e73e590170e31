//! Bucket-to-weight allocation.

use rotator_core::types::Security;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::selector::Bucket;

/// Signed fraction of portfolio value targeted for a security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetWeight {
    pub security: Security,
    pub weight: Decimal,
}

impl TargetWeight {
    pub fn new(security: impl Into<Security>, weight: Decimal) -> Self {
        Self {
            security: security.into(),
            weight,
        }
    }
}

/// Equal-weights the members of each bucket.
///
/// A member of a bucket of size M gets `sign * gross / M`. Securities outside
/// every bucket are implicitly at zero; a security in several buckets gets
/// the sum of its shares.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightAllocator;

impl WeightAllocator {
    pub fn allocate(&self, buckets: &[Bucket]) -> Vec<TargetWeight> {
        let mut targets: Vec<TargetWeight> = Vec::new();

        for bucket in buckets.iter().filter(|b| !b.is_empty()) {
            let share = bucket.side.sign() * bucket.gross_weight / Decimal::from(bucket.len());
            for security in &bucket.members {
                match targets.iter_mut().find(|t| &t.security == security) {
                    Some(existing) => existing.weight += share,
                    None => targets.push(TargetWeight::new(security.clone(), share)),
                }
            }
        }

        targets
    }
}

/// Weight targeted for `security`, zero if absent.
pub fn weight_of(targets: &[TargetWeight], security: &Security) -> Decimal {
    targets
        .iter()
        .find(|t| &t.security == security)
        .map(|t| t.weight)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::BucketSide;
    use rust_decimal_macros::dec;

    fn secs(tickers: &[&str]) -> Vec<Security> {
        tickers.iter().map(|t| Security::new(*t)).collect()
    }

    #[test]
    fn test_best_performer_tie_split() {
        let bucket = Bucket::new(BucketSide::Long, Decimal::ONE, secs(&["A", "B"]));
        let targets = WeightAllocator.allocate(&[bucket]);

        assert_eq!(
            targets,
            vec![
                TargetWeight::new("A", dec!(0.5)),
                TargetWeight::new("B", dec!(0.5)),
            ]
        );
        assert_eq!(weight_of(&targets, &Security::new("C")), Decimal::ZERO);
    }

    #[test]
    fn test_long_short_legs() {
        let buckets = vec![
            Bucket::new(BucketSide::Long, dec!(0.5), secs(&["W1", "W2"])),
            Bucket::new(BucketSide::Short, dec!(0.5), secs(&["L1", "L2", "L3", "L4"])),
        ];
        let targets = WeightAllocator.allocate(&buckets);

        assert_eq!(weight_of(&targets, &Security::new("W1")), dec!(0.25));
        assert_eq!(weight_of(&targets, &Security::new("L3")), dec!(-0.125));

        let long: Decimal = targets.iter().filter(|t| t.weight > Decimal::ZERO).map(|t| t.weight).sum();
        let short: Decimal = targets.iter().filter(|t| t.weight < Decimal::ZERO).map(|t| t.weight).sum();
        assert_eq!(long, dec!(0.5));
        assert_eq!(short, dec!(-0.5));
    }

    #[test]
    fn test_overlapping_buckets_sum() {
        let buckets = vec![
            Bucket::new(BucketSide::Long, dec!(0.5), secs(&["X"])),
            Bucket::new(BucketSide::Short, dec!(0.5), secs(&["X", "Y"])),
        ];
        let targets = WeightAllocator.allocate(&buckets);

        assert_eq!(weight_of(&targets, &Security::new("X")), dec!(0.25));
        assert_eq!(weight_of(&targets, &Security::new("Y")), dec!(-0.25));
    }

    #[test]
    fn test_empty_bucket_ignored() {
        let buckets = vec![Bucket::new(BucketSide::Long, Decimal::ONE, vec![])];
        assert!(WeightAllocator.allocate(&buckets).is_empty());
    }
}
