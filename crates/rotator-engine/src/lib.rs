//! Cross-sectional rebalancing engine.
//!
//! This crate turns asynchronous per-security daily bars into periodic
//! portfolio rotations:
//! - Rolling price windows per security
//! - Once-per-date rebalance scheduling
//! - Momentum / reversal ranking
//! - Best-performer and decile bucket selection
//! - Equal-weight target allocation and order diffing

mod allocator;
mod ranker;
mod rebalancer;
mod registry;
mod rotation;
mod scheduler;
mod selector;
mod universe;
mod window;

pub use allocator::{weight_of, TargetWeight, WeightAllocator};
pub use ranker::{sort_descending, MetricConvention, PerformanceRanker, PerformanceRecord};
pub use rebalancer::{OrderFailure, RebalancePlan, RebalanceReport, RebalanceSettings, Rebalancer};
pub use registry::{PresetInfo, PresetRegistry};
pub use rotation::{BarOutcome, EngineState, RotationConfig, RotationEngine};
pub use scheduler::{ClockState, GatingMode, RebalanceRule, RebalanceScheduler, ScheduleDecision};
pub use selector::{
    BestPerformer, Bucket, BucketSelector, BucketSide, DecileSplit, LegConvention, Selection,
    SelectionPolicy, SkipReason,
};
pub use universe::UniverseState;
pub use window::PriceWindow;
