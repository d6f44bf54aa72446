//! # Subsystem State
//!
//! Shared, observable runtime configuration of a managed subsystem inside a
//! host platform:
//!
//! - named **properties** (insertion-ordered, never holding `null`)
//! - **capabilities**, each with an optional start level, identified by name
//! - one **activation policy** (`EAGER` or `LAZY`, default `LAZY`)
//!
//! Configuration-management code mutates it through [`StateConfigurationApi`];
//! everything else reads immutable snapshots through [`StateQueryApi`] and
//! reacts to [`ChangeEvent`]s instead of polling.
//!
//! ## Notification Contract
//!
//! | Operation | Event | Fires when |
//! |-----------|-------|------------|
//! | `set_property(name, Some(v))` | `PROPERTY`, removed=false, name | always |
//! | `set_property(name, None)` | `PROPERTY`, removed=true, name | always, even if `name` was absent |
//! | `add_capability(c)` | `CAPABILITY`, removed=false, id | always |
//! | `remove_capability(id)` | `CAPABILITY`, removed=true, id | only if a capability was removed |
//! | `set_activation(p)` | `ACTIVATION`, removed=false, `p.name()` | only if `p` differs from the current policy |
//!
//! Observers run synchronously on the mutating thread in registration order.
//! An observer error is returned from the mutator as `StateError::Observer`
//! *after* the change has been applied, and later observers are skipped.
//!
//! ## Lifecycle
//!
//! [`SubsystemState::create_and_register`] builds the state and registers it
//! with the host's [`ServiceRegistry`] under [`SUBSYSTEM_STATE_SERVICE`] in
//! lazy mode. `start` and `stop` do no work; stopping keeps all state.
//!
//! ## Module Structure
//!
//! ```text
//! subsystem-state/
//! ├── domain/      # Capability, Activation, ChangeEvent, StateError
//! ├── ports/       # Query/configuration APIs + service framework traits
//! └── service.rs   # SubsystemState
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{Activation, Capability, ChangeEvent, ChangeKind, StateError};
pub use ports::{
    CapabilitiesView, LifecycleError, ManagedService, MockServiceRegistry, PropertiesView,
    PropertyMap, RegistryError, ServiceName, ServiceRegistry, StartupMode, StateConfigurationApi,
    StateQueryApi,
};
pub use service::{NotificationStats, SubsystemState};

/// Well-known name the state is registered under.
pub const SUBSYSTEM_STATE_SERVICE: &str = "jboss.osgi.subsystem.state";

/// Property listing the modules exposed to the subsystem by the host.
pub const PROP_SYSTEM_MODULES: &str = "org.jboss.osgi.system.modules";

/// Property listing extra host modules exposed on top of [`PROP_SYSTEM_MODULES`].
pub const PROP_SYSTEM_MODULES_EXTRA: &str = "org.jboss.osgi.system.modules.extra";

/// Activation policy of a freshly created state.
pub const DEFAULT_ACTIVATION: Activation = Activation::Lazy;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_activation() {
        assert_eq!(DEFAULT_ACTIVATION, Activation::default());
        assert_eq!(SubsystemState::default().activation_policy(), DEFAULT_ACTIVATION);
    }
}
