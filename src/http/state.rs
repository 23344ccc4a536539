//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::ImportQueue;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for storage operations
    pub repository: Arc<dyn FullRepository>,
    /// Queue feeding the background import workers
    pub import_queue: ImportQueue,
}

impl AppState {
    /// Create application state and start `workers` import workers.
    pub fn new(repository: Arc<dyn FullRepository>, workers: usize) -> Self {
        let import_queue = ImportQueue::start(Arc::clone(&repository), workers);
        Self {
            repository,
            import_queue,
        }
    }
}
