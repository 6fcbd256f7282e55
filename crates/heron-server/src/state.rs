use std::sync::Arc;

use heron::registry::ModelRegistry;
use heron::search::SearchConfig;

/// Shared application state. The registry and search credentials are
/// immutable after startup, so handlers share them without locking.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub search: Option<SearchConfig>,
}

impl AppState {
    pub fn new(registry: ModelRegistry, search: Option<SearchConfig>) -> Self {
        Self {
            registry: Arc::new(registry),
            search,
        }
    }
}
