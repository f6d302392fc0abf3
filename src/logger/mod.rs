//! Logger module
//!
//! - Diagnostic logging through `tracing`
//! - Access logging with multiple formats
//! - Server lifecycle messages

mod format;
mod writer;

pub use format::AccessLogEntry;
pub use writer::AccessLog;

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::deployment::Deployment;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!(
        address = %addr,
        workers = ?config.server.workers,
        project = %config.project.root.display(),
        manifest = %config.project.manifest.display(),
        max_connections = ?config.performance.max_connections,
        "server started, listening on http://{addr}"
    );
    if let Some(ref path) = config.logging.access_log_file {
        tracing::info!(path = %path, "access log file");
    }
}

pub fn log_deployment(deployment: &Deployment) {
    let manifest = deployment.manifest();
    tracing::info!(
        version = manifest.version,
        builds = manifest.builds.len(),
        routes = manifest.routes.len(),
        "deployment loaded"
    );
    for (index, route) in manifest.routes.iter().enumerate() {
        tracing::debug!(index, src = %route.src, dest = %route.dest, "route");
    }
}

pub fn log_connection_error(err: &hyper::Error) {
    // Idle keep-alive connections end with a header timeout
    if err.is_timeout() || err.is_incomplete_message() {
        tracing::debug!(error = %err, "connection closed");
    } else {
        tracing::error!(error = %err, "failed to serve connection");
    }
}
