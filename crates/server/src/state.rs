use std::sync::Arc;

use podclip_core::{Config, JobOrchestrator, StorageConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<JobOrchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Arc<JobOrchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.config.storage
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        self.orchestrator.as_ref()
    }
}
