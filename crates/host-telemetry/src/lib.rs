//! # Host Telemetry
//!
//! Structured logging for the subsystem host.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use host_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HOST_SERVICE_NAME` | `subsystem-host` | Service name attached to startup logs |
//! | `HOST_LOG_LEVEL` or `RUST_LOG` | `info` | Log filter directives |
//! | `HOST_JSON_LOGS` | `false` | Emit JSON lines instead of pretty output |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter could not be parsed.
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter {
        /// The rejected directives.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber was already installed.
    #[error("Failed to initialize logging: {0}")]
    Init(String),
}
