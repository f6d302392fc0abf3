// Server loop module
// Accepts connections until shutdown and applies manifest reloads in between

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::SignalHandler;
use crate::config::AppState;
use crate::logger;

/// How long shutdown waits for in-flight connections
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Run the accept loop until `signals` requests shutdown
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    signals: Arc<SignalHandler>,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                }
            }

            () = signals.reload.notified() => {
                reload_deployment(&state).await;
            }

            () = signals.shutdown.notified() => break,
        }
    }

    // Stop accepting before waiting on in-flight requests
    drop(listener);
    drain_connections(&active_connections).await;
}

/// Swap in a freshly loaded manifest; keeps the current one on failure
pub async fn reload_deployment(state: &AppState) -> bool {
    match state.reload().await {
        Ok(deployment) => {
            logger::log_deployment(&deployment);
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "manifest reload failed, keeping current deployment");
            false
        }
    }
}

async fn drain_connections(active: &AtomicUsize) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    while active.load(Ordering::SeqCst) > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(DRAIN_POLL).await;
    }

    let remaining = active.load(Ordering::SeqCst);
    if remaining > 0 {
        tracing::warn!(remaining, "shutdown with connections still open");
    } else {
        tracing::info!("all connections closed");
    }
}
