//! Core data types for the rotation engine.

mod bar;
mod order;
mod position;
mod security;

pub use bar::DailyBar;
pub use order::{Order, OrderIntent, OrderStatus, Side};
pub use position::{Portfolio, Position};
pub use security::Security;
