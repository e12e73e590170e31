//! Core traits for the rotation engine.

mod broker;

pub use broker::Broker;
