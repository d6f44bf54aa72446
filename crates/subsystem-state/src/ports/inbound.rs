//! # Inbound Ports
//!
//! Hand a collaborator `Arc<dyn StateQueryApi>` when it only reads, and
//! `Arc<dyn StateConfigurationApi>` when it applies management operations.

use crate::domain::{Activation, Capability, ChangeEvent, ChangeKind, StateError};
use serde_json::{Map, Value};
use shared_bus::{EventFilter, Observer, ObserverId, Subscription};
use std::sync::Arc;

/// Insertion-ordered property map.
pub type PropertyMap = Map<String, Value>;

/// Read-only snapshot of the properties.
pub type PropertiesView = Arc<PropertyMap>;

/// Read-only snapshot of the capabilities, in insertion order.
pub type CapabilitiesView = Arc<Vec<Capability>>;

/// Query and notification interface, open to every collaborator.
///
/// Snapshots are immutable and never change after they are returned; call
/// again to see later mutations.
pub trait StateQueryApi: Send + Sync {
    /// All current properties.
    fn properties(&self) -> PropertiesView;

    /// All current capabilities.
    fn capabilities(&self) -> CapabilitiesView;

    /// Current activation policy.
    fn activation_policy(&self) -> Activation;

    /// Register a synchronous observer. It runs on the mutating thread,
    /// after observers registered before it.
    fn subscribe(&self, observer: Arc<dyn Observer<ChangeEvent>>) -> ObserverId;

    /// Remove an observer. Returns `false` if it was not registered.
    fn unsubscribe(&self, id: ObserverId) -> bool;

    /// Async subscription to change events of the given kinds.
    fn changes(&self, filter: EventFilter<ChangeKind>) -> Subscription<ChangeEvent>;
}

/// Mutation interface for configuration-management collaborators.
///
/// Every method notifies observers synchronously before returning. An
/// `Err(StateError::Observer)` means the change was applied but an observer
/// failed, and observers after it were not called.
pub trait StateConfigurationApi: StateQueryApi {
    /// Set `name` to `value`, or remove it when `value` is `None` or JSON
    /// `null`. Returns the previous value. Always emits a `Property` event.
    fn set_property(&self, name: &str, value: Option<Value>) -> Result<Option<Value>, StateError>;

    /// Append a capability without checking for duplicates.
    fn add_capability(&self, capability: Capability) -> Result<(), StateError>;

    /// Remove the first capability with identifier `id`. Returns `Ok(None)`,
    /// without notifying, when there is none.
    fn remove_capability(&self, id: &str) -> Result<Option<Capability>, StateError>;

    /// Change the activation policy. Returns `Ok(false)`, without notifying,
    /// when `policy` is already in effect.
    fn set_activation(&self, policy: Activation) -> Result<bool, StateError>;
}
