//! Historical replay of rotation strategies.

mod report;
mod runner;
mod statistics;

pub use report::ReplayReport;
pub use runner::{ReplayConfig, ReplayRunner};
pub use statistics::{RebalanceRecord, ReplayStats};
