//! # Change Handlers
//!
//! Observers the runtime attaches to the subsystem state.

pub mod change_log;
pub mod start_order;

pub use change_log::ChangeLogger;
pub use start_order::StartOrder;
