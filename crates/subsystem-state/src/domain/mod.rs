//! # Domain Module
//!
//! Value types of the subsystem state: capabilities, the activation policy,
//! change events and errors. No locking or I/O lives here.

pub mod activation;
pub mod capability;
pub mod errors;
pub mod events;

pub use activation::*;
pub use capability::*;
pub use errors::*;
pub use events::*;
