//! # Outbound Ports
//!
//! The narrow slice of the host service framework the state depends on:
//! register under a well-known name, look up by name, and be started and
//! stopped by the framework.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Name a service is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(String);

impl ServiceName {
    /// Create a service name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The well-known name of the subsystem state service.
    #[must_use]
    pub fn subsystem_state() -> Self {
        Self::new(crate::SUBSYSTEM_STATE_SERVICE)
    }

    /// Name as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// When the framework starts a registered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartupMode {
    /// Start as soon as the registry starts its services.
    Active,
    /// Start on first lookup.
    Lazy,
}

/// A service failed to start.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Service start failed: {reason}")]
pub struct LifecycleError {
    /// Why the start failed.
    pub reason: String,
}

impl LifecycleError {
    /// Create a lifecycle error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Registry failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A service is already registered under this name.
    #[error("Service already registered: {0}")]
    DuplicateService(ServiceName),

    /// The service could not be started.
    #[error("Service {name} failed to start: {source}")]
    StartFailed {
        /// Service name.
        name: ServiceName,
        /// Underlying lifecycle error.
        source: LifecycleError,
    },

    /// The registry has been stopped and accepts no new services.
    #[error("Service registry is shut down")]
    ShutDown,
}

/// A service whose lifecycle is driven by the host framework.
#[async_trait]
pub trait ManagedService: Send + Sync + 'static {
    /// Called once before the service is first handed out.
    async fn start(&self) -> Result<(), LifecycleError>;

    /// Called once when the host shuts the service down.
    async fn stop(&self);

    /// The concrete service value, for downcasting after lookup.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Name-based service registry provided by the host framework.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Register `service` under `name`.
    fn register(
        &self,
        name: ServiceName,
        service: Arc<dyn ManagedService>,
        mode: StartupMode,
    ) -> Result<(), RegistryError>;

    /// Resolve a registered service, starting it first if needed.
    ///
    /// `None` when nothing is registered under `name` or it could not start.
    async fn lookup(&self, name: &ServiceName) -> Option<Arc<dyn ManagedService>>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock registry: records registrations, never starts anything.
#[derive(Default)]
pub struct MockServiceRegistry {
    /// Registered services with their startup mode.
    pub services: Mutex<HashMap<ServiceName, (Arc<dyn ManagedService>, StartupMode)>>,
}

impl MockServiceRegistry {
    /// Startup mode a service was registered with.
    #[must_use]
    pub fn mode_of(&self, name: &ServiceName) -> Option<StartupMode> {
        self.services.lock().get(name).map(|(_, mode)| *mode)
    }
}

#[async_trait]
impl ServiceRegistry for MockServiceRegistry {
    fn register(
        &self,
        name: ServiceName,
        service: Arc<dyn ManagedService>,
        mode: StartupMode,
    ) -> Result<(), RegistryError> {
        let mut services = self.services.lock();
        if services.contains_key(&name) {
            return Err(RegistryError::DuplicateService(name));
        }
        services.insert(name, (service, mode));
        Ok(())
    }

    async fn lookup(&self, name: &ServiceName) -> Option<Arc<dyn ManagedService>> {
        self.services
            .lock()
            .get(name)
            .map(|(service, _)| Arc::clone(service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl ManagedService for Noop {
        async fn start(&self) -> Result<(), LifecycleError> {
            Ok(())
        }

        async fn stop(&self) {}

        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    #[tokio::test]
    async fn test_mock_registry_duplicate() {
        let registry = MockServiceRegistry::default();
        let name = ServiceName::new("svc");

        registry
            .register(name.clone(), Arc::new(Noop), StartupMode::Active)
            .unwrap();
        let result = registry.register(name.clone(), Arc::new(Noop), StartupMode::Lazy);

        assert_eq!(result, Err(RegistryError::DuplicateService(name.clone())));
        assert_eq!(registry.mode_of(&name), Some(StartupMode::Active));
    }

    #[tokio::test]
    async fn test_mock_registry_lookup_missing() {
        let registry = MockServiceRegistry::default();
        assert!(registry.lookup(&ServiceName::new("absent")).await.is_none());
    }

    #[test]
    fn test_well_known_name() {
        assert_eq!(
            ServiceName::subsystem_state().as_str(),
            crate::SUBSYSTEM_STATE_SERVICE
        );
    }
}
