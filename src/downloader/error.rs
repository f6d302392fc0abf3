use std::time::Duration;

/// Failure while talking to the media tool
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {}s", timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Tool {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("unreadable media info: {0}")]
    Info(#[from] serde_json::Error),

    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
