//! CLI command implementations.

pub mod presets;
pub mod replay;
pub mod validate;
