use std::sync::Arc;
use tokio::sync::mpsc;
use crate::config::BackendConfig;
use crate::store::JobStore;
use crate::worker::QueuedJob;

/// Shared by every route handler.
#[derive(Clone)]
pub struct BackendState {
    pub store: JobStore,
    pub queue: mpsc::Sender<QueuedJob>,
    pub config: Arc<BackendConfig>,
}

impl BackendState {
    pub fn new(store: JobStore, queue: mpsc::Sender<QueuedJob>, config: BackendConfig) -> Self {
        Self {
            store,
            queue,
            config: Arc::new(config),
        }
    }
}
