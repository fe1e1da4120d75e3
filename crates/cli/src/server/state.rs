use std::sync::Arc;
use std::time::Instant;

use chapterbay_core::ProgressRegistry;

/// Shared state of the status server.
pub struct AppState {
    registry: Arc<ProgressRegistry>,
    started: Instant,
}

impl AppState {
    pub fn new(registry: Arc<ProgressRegistry>) -> Self {
        Self {
            registry,
            started: Instant::now(),
        }
    }

    pub fn registry(&self) -> &ProgressRegistry {
        &self.registry
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
