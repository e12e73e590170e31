//! Broker implementations for the rotation engine.

mod paper;

pub use paper::{PaperBroker, PaperBrokerConfig};
