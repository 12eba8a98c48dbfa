//! Application state management.

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PlaybookConfig;
use crate::error::{Error, Result};

/// A queued playbook request.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub config: PlaybookConfig,
}

/// Shared application state.
pub struct AppState {
    /// Work queue feeding the workers
    queue: mpsc::Sender<Job>,
}

impl AppState {
    /// Create a new application state around the sending half of the work queue.
    pub fn new(queue: mpsc::Sender<Job>) -> Self {
        Self { queue }
    }

    /// Queue a request without waiting. Fails at once when the queue is full.
    pub fn enqueue(&self, config: PlaybookConfig) -> Result<Uuid> {
        let id = Uuid::new_v4();
        match self.queue.try_send(Job { id, config }) {
            Ok(()) => {
                info!(job = %id, "Queued playbook request");
                Ok(id)
            }
            Err(TrySendError::Full(_)) => {
                warn!("Work queue full");
                Err(Error::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(Error::Execution("work queue closed".to_string())),
        }
    }
}
