//! # Ports
//!
//! - **Inbound** (`inbound.rs`): what collaborators may do with the state,
//!   split into a read-only query port and a configuration port.
//! - **Outbound** (`outbound.rs`): what the state needs from the host service
//!   framework (registration, lookup, lifecycle).

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
