//! # Change Events
//!
//! Payload delivered to observers after a mutation.

use super::activation::Activation;
use serde::{Deserialize, Serialize};
use shared_bus::BusEvent;
use std::fmt;

/// What part of the state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    /// The activation policy changed.
    Activation,
    /// A property was set or removed.
    Property,
    /// A capability was added or removed.
    Capability,
}

/// Notification payload: kind, removal flag and affected item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    kind: ChangeKind,
    removed: bool,
    subject_id: String,
}

impl ChangeEvent {
    /// Create an event.
    pub fn new(kind: ChangeKind, removed: bool, subject_id: impl Into<String>) -> Self {
        Self {
            kind,
            removed,
            subject_id: subject_id.into(),
        }
    }

    /// Activation policy set to `policy`.
    #[must_use]
    pub fn activation(policy: Activation) -> Self {
        Self::new(ChangeKind::Activation, false, policy.name())
    }

    /// Property `name` set, or removed when `removed` is true.
    pub fn property(name: impl Into<String>, removed: bool) -> Self {
        Self::new(ChangeKind::Property, removed, name)
    }

    /// Capability `identifier` added, or removed when `removed` is true.
    pub fn capability(identifier: impl Into<String>, removed: bool) -> Self {
        Self::new(ChangeKind::Capability, removed, identifier)
    }

    /// What changed.
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// True when the event reports a removal.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Property name, capability identifier or activation policy name.
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.removed { "removed" } else { "set" };
        write!(f, "{:?} {action}: {}", self.kind, self.subject_id)
    }
}

impl BusEvent for ChangeEvent {
    type Topic = ChangeKind;

    fn topic(&self) -> ChangeKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_event_uses_policy_name() {
        let event = ChangeEvent::activation(Activation::Eager);
        assert_eq!(event.kind(), ChangeKind::Activation);
        assert!(!event.is_removed());
        assert_eq!(event.subject_id(), "EAGER");
    }

    #[test]
    fn test_topic_is_kind() {
        let event = ChangeEvent::capability("x", true);
        assert_eq!(event.topic(), ChangeKind::Capability);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ChangeEvent::property("p", true).to_string(),
            "Property removed: p"
        );
    }
}
