//! # Domain Errors

use shared_bus::ObserverError;
use thiserror::Error;

/// Errors raised by the subsystem state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A required argument was empty.
    #[error("Invalid argument: {parameter} must not be empty")]
    InvalidArgument {
        /// Name of the offending parameter.
        parameter: &'static str,
    },

    /// Text that is not an activation policy name.
    #[error("Unknown activation policy: {0}")]
    UnknownActivation(String),

    /// An observer rejected a change notification.
    ///
    /// The mutation that triggered it has already been applied.
    #[error("Change applied but notification aborted: {0}")]
    Observer(#[from] ObserverError),
}
