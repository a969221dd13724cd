use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::storage::{MemoryStore, Store};

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config,
            store,
            started_at: Utc::now(),
        }
    }

    /// State over an empty in-memory store with default configuration.
    pub fn in_memory() -> Self {
        Self::new(AppConfig::default(), Arc::new(MemoryStore::new()))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.store.backend())
            .field("started_at", &self.started_at)
            .finish()
    }
}
