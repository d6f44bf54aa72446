//! # Capability Start Order
//!
//! Derived view of the capabilities: identifiers ordered by start level,
//! lowest first, capabilities without a level last. Ties keep insertion
//! order. Recomputed from a fresh snapshot on every capability change, so
//! it never needs the event to say *what* changed.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use shared_bus::{Observer, ObserverError, ObserverId};
use subsystem_state::{Capability, ChangeEvent, ChangeKind, SubsystemState};
use tracing::debug;

/// Capability start order kept in sync with a [`SubsystemState`].
#[derive(Debug)]
pub struct StartOrder {
    /// Weak so the state's observer list does not keep the state alive.
    state: Weak<SubsystemState>,
    order: RwLock<Vec<String>>,
    observer: RwLock<Option<ObserverId>>,
}

impl StartOrder {
    /// Compute the current order and subscribe for updates.
    pub fn attach(state: &Arc<SubsystemState>) -> Arc<Self> {
        let this = Arc::new(Self {
            state: Arc::downgrade(state),
            order: RwLock::new(derive_order(&state.capabilities())),
            observer: RwLock::new(None),
        });
        let id = state.subscribe(Arc::clone(&this) as Arc<dyn Observer<ChangeEvent>>);
        *this.observer.write() = Some(id);
        this
    }

    /// Stop tracking. Returns `false` if already detached or the state is gone.
    pub fn detach(&self) -> bool {
        let Some(id) = self.observer.write().take() else {
            return false;
        };
        self.state
            .upgrade()
            .is_some_and(|state| state.unsubscribe(id))
    }

    /// Capability identifiers in start order.
    #[must_use]
    pub fn current(&self) -> Vec<String> {
        self.order.read().clone()
    }
}

impl Observer<ChangeEvent> for StartOrder {
    fn on_event(&self, event: &ChangeEvent) -> Result<(), ObserverError> {
        if event.kind() != ChangeKind::Capability {
            return Ok(());
        }
        let Some(state) = self.state.upgrade() else {
            return Ok(());
        };

        let order = derive_order(&state.capabilities());
        debug!(trigger = %event, size = order.len(), "Start order recomputed");
        *self.order.write() = order;
        Ok(())
    }
}

fn derive_order(capabilities: &[Capability]) -> Vec<String> {
    let mut sorted: Vec<&Capability> = capabilities.iter().collect();
    // Stable sort: equal levels keep insertion order.
    sorted.sort_by_key(|c| (c.priority().is_none(), c.priority()));
    sorted
        .into_iter()
        .map(|c| c.identifier().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use subsystem_state::StateConfigurationApi;

    fn cap(id: &str, priority: Option<i32>) -> Capability {
        Capability::new(id, priority).unwrap()
    }

    #[test]
    fn test_derive_order() {
        let caps = vec![
            cap("none", None),
            cap("three", Some(3)),
            cap("one", Some(1)),
            cap("three-again", Some(3)),
            cap("negative", Some(-2)),
        ];
        assert_eq!(
            derive_order(&caps),
            vec!["negative", "one", "three", "three-again", "none"]
        );
    }

    #[test]
    fn test_tracks_capability_changes() {
        let state = Arc::new(SubsystemState::default());
        state.add_capability(cap("late", Some(9))).unwrap();
        let order = StartOrder::attach(&state);
        assert_eq!(order.current(), vec!["late"]);

        state.add_capability(cap("early", Some(1))).unwrap();
        assert_eq!(order.current(), vec!["early", "late"]);

        state.remove_capability("late").unwrap();
        assert_eq!(order.current(), vec!["early"]);
    }

    #[test]
    fn test_detach() {
        let state = Arc::new(SubsystemState::default());
        let order = StartOrder::attach(&state);
        assert_eq!(state.observer_count(), 1);

        assert!(order.detach());
        assert!(!order.detach());
        assert_eq!(state.observer_count(), 0);

        state.add_capability(cap("ignored", None)).unwrap();
        assert!(order.current().is_empty());
    }

    #[test]
    fn test_state_dropped() {
        let state = Arc::new(SubsystemState::default());
        let order = StartOrder::attach(&state);
        drop(state);
        assert!(!order.detach());
    }
}
