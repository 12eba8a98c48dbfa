//! HTTP front end for ansible-shim.
//!
//! `POST /ansible` accepts a JSON playbook configuration (optionally gzip
//! encoded) and queues it for one of a fixed set of workers. The response
//! only says whether the request was queued; results are logged.
//!
//! # Example
//!
//! ```rust,ignore
//! use ansible_shim::api::{ApiConfig, ApiServer};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = ApiConfig::from_http_addr(":8080").unwrap();
//!     ApiServer::new(config).run_with_shutdown(shutdown_signal()).await
//! }
//! ```

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod worker;

use std::sync::Arc;

use axum::Router;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::{Error, Result};

pub use error::{ApiError, ApiResult};
pub use state::{AppState, Job};

/// Maximum number of playbooks running at once, and queued at once.
pub const MAX_CONCURRENT_PLAYBOOKS: usize = 5;

static HOST_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^[a-zA-Z0-9./\-_]?):([0-9]{2,5})$").expect("Invalid host:port regex")
});

/// Configuration for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Host to bind; empty means all interfaces
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Number of worker tasks
    pub workers: usize,
    /// Queue capacity; submissions beyond it are rejected
    pub queue_capacity: usize,
}

impl ApiConfig {
    /// Parse an `HTTP_ADDR` value such as `:8080`.
    pub fn from_http_addr(addr: &str) -> Result<Self> {
        let caps = HOST_PORT_REGEX.captures(addr).ok_or_else(|| {
            Error::input(format!(
                "HTTP_ADDR '{}' does not match expected hostname:port pattern",
                addr
            ))
        })?;
        let port = caps[2]
            .parse()
            .map_err(|_| Error::input(format!("HTTP_ADDR port out of range: {}", &caps[2])))?;

        Ok(Self {
            host: caps[1].to_string(),
            port,
            workers: MAX_CONCURRENT_PLAYBOOKS,
            queue_capacity: MAX_CONCURRENT_PLAYBOOKS,
        })
    }

    /// Host to pass to the resolver.
    pub fn bind_host(&self) -> &str {
        if self.host.is_empty() {
            "0.0.0.0"
        } else {
            &self.host
        }
    }
}

/// The API server: router, queue and workers.
pub struct ApiServer {
    config: ApiConfig,
    state: Arc<AppState>,
    receiver: mpsc::Receiver<Job>,
}

impl ApiServer {
    /// Create a new API server with the given configuration.
    pub fn new(config: ApiConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let state = Arc::new(AppState::new(sender));
        Self {
            config,
            state,
            receiver,
        }
    }

    /// Build the router with all routes.
    pub fn router(&self) -> Router {
        routes::api_routes(self.state.clone()).layer(TraceLayer::new_for_http())
    }

    /// Get a reference to the application state.
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Serve until `shutdown` resolves, then stop the workers.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::result::Result<(), std::io::Error> {
        let router = self.router();
        let token = CancellationToken::new();
        let receiver = Arc::new(Mutex::new(self.receiver));

        let workers: Vec<_> = (0..self.config.workers)
            .map(|id| tokio::spawn(worker::run_worker(id, receiver.clone(), token.clone())))
            .collect();
        info!("Started {} workers", workers.len());

        let listener = TcpListener::bind((self.config.bind_host(), self.config.port)).await?;
        info!("server started: {}", listener.local_addr()?);

        let stop = token.clone();
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                stop.cancel();
            })
            .await;

        token.cancel();
        for handle in workers {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!("Worker ended abnormally: {}", e);
                }
            }
        }
        result
    }
}

/// Resolves on SIGINT, SIGTERM or SIGHUP.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        let mut hup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                warn!("Could not install SIGHUP handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
            _ = term.recv() => info!("Received SIGTERM"),
            _ = hup.recv() => info!("Received SIGHUP"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_addr_parsing() {
        let config = ApiConfig::from_http_addr(":8080").unwrap();
        assert_eq!(config.host, "");
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_host(), "0.0.0.0");
        assert_eq!(config.workers, 5);
        assert_eq!(config.queue_capacity, 5);

        let config = ApiConfig::from_http_addr("a:80").unwrap();
        assert_eq!(config.bind_host(), "a");
    }

    #[test]
    fn test_http_addr_rejected() {
        for addr in ["8080", "localhost:8080", ":1", ":123456", ":http", "0.0.0.0:8080"] {
            let err = ApiConfig::from_http_addr(addr).unwrap_err();
            assert!(err.is_input(), "{} should be rejected", addr);
        }
        assert!(ApiConfig::from_http_addr(":99999").is_err());
    }
}
