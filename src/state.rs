use crate::infrastructure::queue::JobQueue;
use crate::modules::jobs::repository::JobStore;
use std::sync::Arc;

/// Shared by every request handler. The worker side holds its own
/// references to the same store.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<dyn JobStore>,
    pub queue: Arc<dyn JobQueue>,
}

impl AppState {
    pub fn new(jobs: Arc<dyn JobStore>, queue: Arc<dyn JobQueue>) -> Self {
        Self { jobs, queue }
    }
}
