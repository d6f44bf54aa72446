//! # Host Runtime
//!
//! Wires the registry, the subsystem state and the change observers.
//!
//! ## Startup Sequence
//!
//! 1. Create the registry and register the state (lazy)
//! 2. Attach the change logger and the start order tracker
//! 3. Start active services
//! 4. Resolve the state through the registry (starts it)
//! 5. Apply configured properties, then capabilities
//!
//! ## Shutdown Sequence
//!
//! 1. Stop services in reverse registration order
//! 2. Reject further registrations

use std::sync::Arc;

use shared_bus::Observer;
use subsystem_state::{
    ChangeEvent, RegistryError, ServiceName, StateConfigurationApi, StateError, SubsystemState,
};
use thiserror::Error;
use tracing::info;

use crate::container::HostConfig;
use crate::handlers::{ChangeLogger, StartOrder};
use crate::registry::InMemoryServiceRegistry;

/// Runtime failures.
#[derive(Debug, Error)]
pub enum HostError {
    /// The registry rejected an operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// One or more active services failed to start.
    #[error("{} service(s) failed to start", .0.len())]
    Startup(Vec<RegistryError>),

    /// A registered service could not be resolved.
    #[error("Service unavailable: {0}")]
    Unavailable(ServiceName),

    /// Applying configuration to the state failed.
    #[error(transparent)]
    State(#[from] StateError),
}

/// The running host.
pub struct HostRuntime {
    config: HostConfig,
    registry: Arc<InMemoryServiceRegistry>,
    state: Arc<SubsystemState>,
    change_log: Arc<ChangeLogger>,
    start_order: Arc<StartOrder>,
}

impl HostRuntime {
    /// Register the state and attach observers. Nothing is started yet.
    pub fn new(config: HostConfig) -> Result<Self, HostError> {
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let state = SubsystemState::create_and_register(&*registry, config.activation)?;

        let change_log = Arc::new(ChangeLogger::new());
        state.subscribe(Arc::clone(&change_log) as Arc<dyn Observer<ChangeEvent>>);
        let start_order = StartOrder::attach(&state);

        Ok(Self {
            config,
            registry,
            state,
            change_log,
            start_order,
        })
    }

    /// Start services and apply the configuration.
    pub async fn start(&self) -> Result<(), HostError> {
        info!("===========================================");
        info!("  Subsystem Host Runtime");
        info!("===========================================");

        self.registry.start_all().await.map_err(HostError::Startup)?;

        let state = SubsystemState::lookup(&*self.registry)
            .await
            .ok_or_else(|| HostError::Unavailable(ServiceName::subsystem_state()))?;
        self.apply_config(&*state)?;

        info!(
            activation = %state.activation_policy(),
            properties = state.properties().len(),
            capabilities = state.capabilities().len(),
            "Subsystem state configured"
        );
        Ok(())
    }

    fn apply_config(&self, state: &dyn StateConfigurationApi) -> Result<(), HostError> {
        for (name, value) in &self.config.properties {
            state.set_property(name, Some(value.clone()))?;
        }
        for capability in &self.config.capabilities {
            state.add_capability(capability.clone())?;
        }
        Ok(())
    }

    /// Stop all services.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.registry.stop_all().await;
        let stats = self.state.notification_stats();
        info!(
            changes = self.change_log.logged(),
            notifications = stats.notifications,
            events_published = stats.events_published,
            async_subscribers = stats.async_subscribers,
            channel_capacity = stats.channel_capacity,
            "Shutdown complete"
        );
    }

    /// The subsystem state.
    #[must_use]
    pub fn state(&self) -> Arc<SubsystemState> {
        Arc::clone(&self.state)
    }

    /// The service registry.
    #[must_use]
    pub fn registry(&self) -> Arc<InMemoryServiceRegistry> {
        Arc::clone(&self.registry)
    }

    /// The configuration this runtime was built with.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The change logger.
    #[must_use]
    pub fn change_log(&self) -> &ChangeLogger {
        &self.change_log
    }

    /// Capability identifiers in start order.
    #[must_use]
    pub fn start_order(&self) -> Vec<String> {
        self.start_order.current()
    }
}
