//! Workers that run queued playbook requests.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::state::Job;
use crate::config::{Metrics, PlaybookConfig};
use crate::env::ExecutionContext;
use crate::error::Result;
use crate::playbook::PlaybookRunner;
use crate::security::ensure_dir;
use crate::validate::validate_inputs;

/// Take jobs from the shared queue until it closes or `token` is cancelled.
pub async fn run_worker(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Job>>>,
    token: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            _ = token.cancelled() => break,
            job = async { queue.lock().await.recv().await } => job,
        };
        let Some(job) = job else { break };

        let job_id = job.id;
        info!(worker = id, job = %job_id, "Worker processing request");
        let metrics = process_job(job).await;
        match &metrics.error {
            None if metrics.exit_code == 0 => {
                info!(job = %job_id, hosts = metrics.inventory_count, "Playbook succeeded")
            }
            None => warn!(job = %job_id, rc = metrics.exit_code, "Playbook failed"),
            Some(e) => error!(job = %job_id, "Error running playbook: {}", e),
        }
    }
    info!(worker = id, "Worker stopped");
}

/// Validate, project and run one request, returning its metrics.
///
/// Each job gets its own temp directory so concurrent container runs do not
/// share a generated configuration file.
pub async fn process_job(job: Job) -> Metrics {
    let mut config = job.config;
    config.temp_dir_path = Path::new(&config.temp_dir_path)
        .join(job.id.to_string())
        .display()
        .to_string();

    match run_config(&mut config).await {
        Ok(rc) => config.metrics.exit_code = rc,
        Err(e) => {
            config.metrics.exit_code = 1;
            config.metrics.error = Some(e.to_string());
        }
    }

    if let Err(e) = std::fs::remove_dir_all(&config.temp_dir_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove {}: {}", config.temp_dir_path, e);
        }
    }
    config.metrics
}

async fn run_config(config: &mut PlaybookConfig) -> Result<i32> {
    if let Some(parent) = Path::new(&config.temp_dir_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    ensure_dir(&config.temp_dir_path)?;
    validate_inputs(config)?;
    let context = ExecutionContext::project(config)?;
    PlaybookRunner::new(context).run(config).await
}
