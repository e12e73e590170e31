//! Error types for the rotation engine.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Security;

/// Top-level error for host code built around the engine.
#[derive(Error, Debug)]
pub enum RotatorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised by the rebalancing engine.
///
/// Only the configuration variants are fatal. `NotReady`, `PriceUnavailable`
/// and `OrderSubmission` are recovered inside a rebalance cycle and reported
/// back to the caller alongside the orders that did go out.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Security {0} is not part of the configured universe")]
    UnknownSecurity(Security),

    #[error("Invalid price {price} for {security}")]
    InvalidPrice { security: Security, price: Decimal },

    #[error("Not ready: {security} has {available} of {required} prices")]
    NotReady {
        security: Security,
        required: usize,
        available: usize,
    },

    #[error("No usable price for {security}")]
    PriceUnavailable { security: Security },

    #[error("Order for {security} failed: {source}")]
    OrderSubmission {
        security: Security,
        #[source]
        source: BrokerError,
    },
}

impl EngineError {
    /// Whether the error is a misconfiguration that must be surfaced to the host.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Configuration(_)
                | EngineError::UnknownSecurity(_)
                | EngineError::InvalidPrice { .. }
        )
    }
}

/// Broker-specific errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrokerError {
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("No market price for {0}")]
    NoMarketPrice(Security),

    #[error("Invalid volume: {0}")]
    InvalidVolume(Decimal),
}

/// Data source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No data file found for {0}")]
    SymbolNotFound(Security),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Feed closed: {0}")]
    FeedClosed(String),
}

/// Result type alias for host-level operations.
pub type RotatorResult<T> = Result<T, RotatorError>;
