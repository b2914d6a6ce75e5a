// Application state module
// Shared per-process state handed to every request

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::Config;
use crate::store::SharedStore;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Document store, injected at startup
    pub store: SharedStore,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: &Config, store: SharedStore) -> Self {
        Self {
            config: config.clone(),
            store,
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
        }
    }
}
