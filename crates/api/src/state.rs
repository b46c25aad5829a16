use std::sync::Arc;

use taskbench_db::store::TaskStore;

use crate::config::ServerConfig;

/// Shared application state available to all handlers.
///
/// Handlers go through the `TaskStore` trait rather than a concrete
/// pool so integration tests can run against the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub config: Arc<ServerConfig>,
}
