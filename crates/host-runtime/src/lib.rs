//! # Host Runtime Library
//!
//! Composition root for a managed subsystem. Stands in for the host service
//! framework: it owns the service registry, creates and registers the
//! [`SubsystemState`](subsystem_state::SubsystemState), applies startup
//! configuration through the configuration API, and attaches the runtime's
//! own change observers.
//!
//! The main entry point is the `main.rs` binary.
//!
//! ## Module Structure
//!
//! ```text
//! host-runtime/
//! ├── container/   # HostConfig (environment)
//! ├── handlers/    # Change observers: ChangeLogger, StartOrder
//! ├── registry/    # InMemoryServiceRegistry
//! └── runtime.rs   # HostRuntime wiring
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod container;
pub mod handlers;
pub mod registry;
pub mod runtime;

pub use container::{ConfigError, HostConfig};
pub use handlers::{ChangeLogger, StartOrder};
pub use registry::{InMemoryServiceRegistry, ServiceStatus};
pub use runtime::{HostError, HostRuntime};
