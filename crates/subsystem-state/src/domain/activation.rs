//! # Activation Policy

use super::errors::StateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether the subsystem's capabilities start at subsystem startup or on
/// first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Activation {
    /// Start everything when the subsystem starts.
    Eager,
    /// Start on first use.
    #[default]
    Lazy,
}

impl Activation {
    /// Canonical upper-case name, as carried in change events.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Eager => "EAGER",
            Self::Lazy => "LAZY",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EAGER" => Ok(Self::Eager),
            "LAZY" => Ok(Self::Lazy),
            _ => Err(StateError::UnknownActivation(s.to_string())),
        }
    }
}
