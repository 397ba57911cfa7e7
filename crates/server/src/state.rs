use std::sync::Arc;

use enasub_core::{Config, ReconcileScheduler, SanitizedConfig, SubmissionStore};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn SubmissionStore>,
    scheduler: Arc<ReconcileScheduler>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn SubmissionStore>,
        scheduler: Arc<ReconcileScheduler>,
    ) -> Self {
        Self {
            config,
            store,
            scheduler,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn SubmissionStore {
        self.store.as_ref()
    }

    pub fn scheduler(&self) -> &ReconcileScheduler {
        self.scheduler.as_ref()
    }
}
