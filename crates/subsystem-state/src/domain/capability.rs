//! # Capability
//!
//! An identified unit of subsystem functionality with an optional start level.
//! Identity is the identifier alone: two capabilities that differ only in
//! priority compare equal and hash the same.

use super::errors::StateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An immutable capability entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawCapability")]
pub struct Capability {
    identifier: String,
    priority: Option<i32>,
}

/// Unvalidated wire form, checked on deserialization.
#[derive(Deserialize)]
struct RawCapability {
    identifier: String,
    #[serde(default)]
    priority: Option<i32>,
}

impl TryFrom<RawCapability> for Capability {
    type Error = StateError;

    fn try_from(raw: RawCapability) -> Result<Self, Self::Error> {
        Self::new(raw.identifier, raw.priority)
    }
}

impl Capability {
    /// Create a capability.
    ///
    /// # Errors
    ///
    /// `StateError::InvalidArgument` if `identifier` is empty.
    pub fn new(identifier: impl Into<String>, priority: Option<i32>) -> Result<Self, StateError> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(StateError::InvalidArgument {
                parameter: "identifier",
            });
        }
        Ok(Self {
            identifier,
            priority,
        })
    }

    /// Identity key of this capability.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Start level, if one was given.
    #[must_use]
    pub fn priority(&self) -> Option<i32> {
        self.priority
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Capability {}

impl Hash for Capability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.priority {
            Some(level) => write!(
                f,
                "Capability[identifier={},priority={level}]",
                self.identifier
            ),
            None => write!(f, "Capability[identifier={},priority=none]", self.identifier),
        }
    }
}
