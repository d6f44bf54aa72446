//! Logs every state change at `info`.

use std::sync::atomic::{AtomicU64, Ordering};

use shared_bus::{Observer, ObserverError};
use subsystem_state::ChangeEvent;
use tracing::info;

/// Observer that writes one structured log line per change.
#[derive(Debug, Default)]
pub struct ChangeLogger {
    logged: AtomicU64,
}

impl ChangeLogger {
    /// Create a logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of changes logged so far.
    #[must_use]
    pub fn logged(&self) -> u64 {
        self.logged.load(Ordering::Relaxed)
    }
}

impl Observer<ChangeEvent> for ChangeLogger {
    fn on_event(&self, event: &ChangeEvent) -> Result<(), ObserverError> {
        self.logged.fetch_add(1, Ordering::Relaxed);
        info!(
            kind = ?event.kind(),
            subject = event.subject_id(),
            removed = event.is_removed(),
            "Subsystem state changed"
        );
        Ok(())
    }
}
