// Signal handling module
//
// - SIGHUP:  reload the deployment manifest
// - SIGTERM: shutdown
// - SIGINT:  shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

/// Signal handler state
pub struct SignalHandler {
    /// Shutdown signal (SIGTERM, SIGINT)
    pub shutdown: Notify,
    /// Reload signal (SIGHUP)
    pub reload: Notify,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            shutdown: Notify::new(),
            reload: Notify::new(),
        }
    }

    pub fn request_reload(&self) {
        // notify_one keeps a permit if the loop is busy
        self.reload.notify_one();
    }

    pub fn request_shutdown(&self) {
        self.shutdown.notify_one();
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Register Unix signal handlers and forward them to `handler`
#[cfg(unix)]
pub fn start_signal_handler(handler: Arc<SignalHandler>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    // Register before spawning so failures reach the caller
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tracing::info!(
        pid = std::process::id(),
        "signal handlers registered: SIGHUP reloads the manifest, SIGTERM/SIGINT shut down"
    );

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!("SIGHUP received, reloading manifest");
                    handler.request_reload();
                }
                _ = sigterm.recv() => {
                    tracing::info!("SIGTERM received, shutting down");
                    handler.request_shutdown();
                    break;
                }
                _ = sigint.recv() => {
                    tracing::info!("SIGINT received, shutting down");
                    handler.request_shutdown();
                    break;
                }
            }
        }
    });

    Ok(())
}

/// Non-Unix fallback: only Ctrl+C is supported
#[cfg(not(unix))]
pub fn start_signal_handler(handler: Arc<SignalHandler>) -> std::io::Result<()> {
    tracing::info!("only Ctrl+C is supported on this platform; manifest reload is unavailable");

    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            tracing::info!("Ctrl+C received, shutting down");
            handler.request_shutdown();
        }
    });

    Ok(())
}
