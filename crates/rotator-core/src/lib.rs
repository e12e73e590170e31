//! Core types and traits for the rotation engine.
//!
//! This crate provides the foundational building blocks including:
//! - Security identifiers and finished daily bars
//! - Order intents, orders, positions and portfolios
//! - The broker trait the engine trades through

pub mod types;
pub mod traits;
pub mod error;

pub use error::{RotatorError, RotatorResult};
pub use types::*;
pub use traits::*;
