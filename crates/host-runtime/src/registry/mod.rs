//! # Service Registry
//!
//! In-memory implementation of the host framework's name-based service
//! registry.
//!
//! ## Lifecycle
//!
//! ```text
//! register ──► Registered ──(start_all, Active)──► Starting ──► Running ──(stop_all)──► Stopped
//!                   │                                  │
//!                   └──────(first lookup, any mode)────┘──► Failed
//! ```
//!
//! - `Lazy` services start on their first `lookup`.
//! - `Active` services start in `start_all` (or on lookup, if that comes first).
//! - A service is started at most once; concurrent lookups wait for the
//!   same start.
//! - `stop_all` stops running services in reverse registration order. After
//!   it, `register` fails with `RegistryError::ShutDown` and `lookup` returns
//!   `None`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use subsystem_state::{
    LifecycleError, ManagedService, RegistryError, ServiceName, ServiceRegistry, StartupMode,
};
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    /// Registered but not started.
    Registered,
    /// Starting up.
    Starting,
    /// Running normally.
    Running,
    /// Stopped gracefully.
    Stopped,
    /// Failed to start.
    Failed,
}

struct Registration {
    name: ServiceName,
    service: Arc<dyn ManagedService>,
    mode: StartupMode,
    started: OnceCell<Result<(), LifecycleError>>,
    status: RwLock<ServiceStatus>,
}

impl Registration {
    fn set_status(&self, status: ServiceStatus) {
        *self.status.write() = status;
    }

    fn status(&self) -> ServiceStatus {
        *self.status.read()
    }
}

/// The host's service registry.
#[derive(Default)]
pub struct InMemoryServiceRegistry {
    /// Registrations in registration order.
    services: RwLock<Vec<Arc<Registration>>>,
    /// Set once `stop_all` has begun.
    shut_down: AtomicBool,
}

impl InMemoryServiceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, name: &ServiceName) -> Option<Arc<Registration>> {
        self.services
            .read()
            .iter()
            .find(|reg| &reg.name == name)
            .map(Arc::clone)
    }

    /// Start `reg` unless a start already happened or is in progress.
    async fn ensure_started(&self, reg: &Registration) -> Result<(), LifecycleError> {
        reg.started
            .get_or_init(|| async {
                info!(service = %reg.name, "[Registry] Starting service");
                reg.set_status(ServiceStatus::Starting);

                let outcome = reg.service.start().await;
                match &outcome {
                    Ok(()) => {
                        reg.set_status(ServiceStatus::Running);
                        info!(service = %reg.name, "[Registry] Service running");
                    }
                    Err(e) => {
                        reg.set_status(ServiceStatus::Failed);
                        warn!(service = %reg.name, error = %e, "[Registry] Service failed to start");
                    }
                }
                outcome
            })
            .await
            .clone()
    }

    /// Start every `Active` service that has not started yet.
    ///
    /// Keeps going past failures and returns all of them.
    pub async fn start_all(&self) -> Result<(), Vec<RegistryError>> {
        let services = self.services.read().clone();
        let mut errors = Vec::new();

        for reg in services.iter().filter(|r| r.mode == StartupMode::Active) {
            if let Err(source) = self.ensure_started(reg).await {
                errors.push(RegistryError::StartFailed {
                    name: reg.name.clone(),
                    source,
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Stop all running services in reverse registration order and refuse
    /// further registrations.
    pub async fn stop_all(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        let services = self.services.read().clone();

        for reg in services.iter().rev() {
            if reg.status() != ServiceStatus::Running {
                continue;
            }
            info!(service = %reg.name, "[Registry] Stopping service");
            reg.service.stop().await;
            reg.set_status(ServiceStatus::Stopped);
        }

        info!("[Registry] All services stopped");
    }

    /// Whether `stop_all` has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Status of a service, `None` if not registered.
    #[must_use]
    pub fn status(&self, name: &ServiceName) -> Option<ServiceStatus> {
        self.find(name).map(|reg| reg.status())
    }

    /// Startup mode a service was registered with.
    #[must_use]
    pub fn mode(&self, name: &ServiceName) -> Option<StartupMode> {
        self.find(name).map(|reg| reg.mode)
    }

    /// Registered names in registration order.
    #[must_use]
    pub fn service_names(&self) -> Vec<ServiceName> {
        self.services
            .read()
            .iter()
            .map(|reg| reg.name.clone())
            .collect()
    }

    /// Log every service with its mode and status.
    pub fn log_status(&self) {
        info!("[Registry] Service Status:");
        for reg in self.services.read().iter() {
            info!(
                "  {} [{:?}]: {:?}",
                reg.name,
                reg.mode,
                reg.status()
            );
        }
    }
}

#[async_trait]
impl ServiceRegistry for InMemoryServiceRegistry {
    fn register(
        &self,
        name: ServiceName,
        service: Arc<dyn ManagedService>,
        mode: StartupMode,
    ) -> Result<(), RegistryError> {
        if self.is_shut_down() {
            return Err(RegistryError::ShutDown);
        }

        let mut services = self.services.write();
        if services.iter().any(|reg| reg.name == name) {
            return Err(RegistryError::DuplicateService(name));
        }

        info!(service = %name, mode = ?mode, "[Registry] Registering service");
        services.push(Arc::new(Registration {
            name,
            service,
            mode,
            started: OnceCell::new(),
            status: RwLock::new(ServiceStatus::Registered),
        }));
        Ok(())
    }

    async fn lookup(&self, name: &ServiceName) -> Option<Arc<dyn ManagedService>> {
        if self.is_shut_down() {
            return None;
        }
        let reg = self.find(name)?;
        self.ensure_started(&reg).await.ok()?;
        Some(Arc::clone(&reg.service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::any::Any;
    use std::sync::atomic::AtomicUsize;

    /// Records lifecycle calls into a shared journal.
    struct Probe {
        label: &'static str,
        fail_start: bool,
        starts: AtomicUsize,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl Probe {
        fn new(label: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                label,
                fail_start: false,
                starts: AtomicUsize::new(0),
                journal: Arc::clone(journal),
            })
        }

        fn failing(label: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                label,
                fail_start: true,
                starts: AtomicUsize::new(0),
                journal: Arc::clone(journal),
            })
        }
    }

    #[async_trait]
    impl ManagedService for Probe {
        async fn start(&self) -> Result<(), LifecycleError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.journal.lock().push(format!("start:{}", self.label));
            if self.fail_start {
                return Err(LifecycleError::new("refused"));
            }
            Ok(())
        }

        async fn stop(&self) {
            self.journal.lock().push(format!("stop:{}", self.label));
        }

        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    fn name(s: &str) -> ServiceName {
        ServiceName::new(s)
    }

    #[tokio::test]
    async fn test_lazy_service_starts_on_first_lookup() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let registry = InMemoryServiceRegistry::new();
        let probe = Probe::new("lazy", &journal);
        registry
            .register(name("lazy"), probe.clone(), StartupMode::Lazy)
            .unwrap();

        registry.start_all().await.unwrap();
        assert_eq!(registry.status(&name("lazy")), Some(ServiceStatus::Registered));

        assert!(registry.lookup(&name("lazy")).await.is_some());
        assert!(registry.lookup(&name("lazy")).await.is_some());
        assert_eq!(registry.status(&name("lazy")), Some(ServiceStatus::Running));
        assert_eq!(probe.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_active_service_starts_in_start_all() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let registry = InMemoryServiceRegistry::new();
        registry
            .register(name("active"), Probe::new("active", &journal), StartupMode::Active)
            .unwrap();

        registry.start_all().await.unwrap();
        assert_eq!(registry.status(&name("active")), Some(ServiceStatus::Running));
        assert_eq!(*journal.lock(), vec!["start:active"]);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let registry = InMemoryServiceRegistry::new();
        registry
            .register(name("svc"), Probe::new("a", &journal), StartupMode::Lazy)
            .unwrap();

        let result = registry.register(name("svc"), Probe::new("b", &journal), StartupMode::Active);
        assert_eq!(result, Err(RegistryError::DuplicateService(name("svc"))));
        assert_eq!(registry.mode(&name("svc")), Some(StartupMode::Lazy));
    }

    #[tokio::test]
    async fn test_lookup_unknown_is_none() {
        let registry = InMemoryServiceRegistry::new();
        assert!(registry.lookup(&name("absent")).await.is_none());
        assert_eq!(registry.status(&name("absent")), None);
    }

    #[tokio::test]
    async fn test_failed_start_is_reported_once() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let registry = InMemoryServiceRegistry::new();
        let probe = Probe::failing("broken", &journal);
        registry
            .register(name("broken"), probe.clone(), StartupMode::Active)
            .unwrap();

        let errors = registry.start_all().await.unwrap_err();
        assert_eq!(
            errors,
            vec![RegistryError::StartFailed {
                name: name("broken"),
                source: LifecycleError::new("refused"),
            }]
        );
        assert_eq!(registry.status(&name("broken")), Some(ServiceStatus::Failed));

        // Not retried on lookup.
        assert!(registry.lookup(&name("broken")).await.is_none());
        assert_eq!(probe.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_all_reverse_order_and_skips_unstarted() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let registry = InMemoryServiceRegistry::new();
        registry
            .register(name("first"), Probe::new("first", &journal), StartupMode::Active)
            .unwrap();
        registry
            .register(name("idle"), Probe::new("idle", &journal), StartupMode::Lazy)
            .unwrap();
        registry
            .register(name("second"), Probe::new("second", &journal), StartupMode::Active)
            .unwrap();

        registry.start_all().await.unwrap();
        registry.stop_all().await;

        assert_eq!(
            *journal.lock(),
            vec!["start:first", "start:second", "stop:second", "stop:first"]
        );
        assert_eq!(registry.status(&name("first")), Some(ServiceStatus::Stopped));
        assert_eq!(registry.status(&name("idle")), Some(ServiceStatus::Registered));
    }

    #[tokio::test]
    async fn test_register_after_stop_all() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let registry = InMemoryServiceRegistry::new();
        registry
            .register(name("svc"), Probe::new("svc", &journal), StartupMode::Lazy)
            .unwrap();
        registry.stop_all().await;

        let result = registry.register(name("late"), Probe::new("late", &journal), StartupMode::Lazy);
        assert_eq!(result, Err(RegistryError::ShutDown));
        assert!(registry.is_shut_down());
        assert!(registry.lookup(&name("svc")).await.is_none());
    }

    #[tokio::test]
    async fn test_service_names_in_registration_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let registry = InMemoryServiceRegistry::new();
        for label in ["b", "a", "c"] {
            registry
                .register(name(label), Probe::new("x", &journal), StartupMode::Lazy)
                .unwrap();
        }
        assert_eq!(
            registry.service_names(),
            vec![name("b"), name("a"), name("c")]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lookups_start_once() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(InMemoryServiceRegistry::new());
        let probe = Probe::new("shared", &journal);
        registry
            .register(name("shared"), probe.clone(), StartupMode::Lazy)
            .unwrap();

        let lookups: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.lookup(&name("shared")).await.is_some() })
            })
            .collect();

        for lookup in lookups {
            assert!(lookup.await.unwrap());
        }
        assert_eq!(probe.starts.load(Ordering::SeqCst), 1);
    }
}
