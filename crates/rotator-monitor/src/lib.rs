//! Logging and engine status reporting.

mod logging;
mod status;

pub use logging::setup_logging;
pub use status::{log_engine_state, render_engine_state};
