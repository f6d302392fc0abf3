// Configuration module entry point
// Manages application configuration and runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::time::Duration;

pub use state::AppState;
pub use types::{
    Config, DownloaderConfig, FunctionBinding, HttpConfig, LoggingConfig, PerformanceConfig,
    ProjectConfig, ServerConfig,
};

/// Slack added to a derived function timeout on top of the media tool runs
const FUNCTION_TIMEOUT_MARGIN_SECS: u64 = 5;

/// Error raised while building the runtime configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid address '{addr}': {source}")]
    Address {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("function '{src}' is bound to unknown handler '{handler}'")]
    UnknownHandler { src: String, handler: String },

    #[error(transparent)]
    Manifest(#[from] crate::manifest::ManifestError),

    #[error("failed to prepare '{}': {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("ROUTER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("project.root", "site")?
            .set_default("project.manifest", "vercel.json")?
            .set_default("project.index_files", vec!["index.html", "index.htm"])?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 600)?
            .set_default("http.server_name", "deploy-router")?
            .set_default("http.enable_cors", true)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("downloader.program", "yt-dlp")?
            .set_default("downloader.download_dir", "downloads")?
            .set_default("downloader.timeout_secs", 600)?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// How long a function may take to respond.
    ///
    /// Unless `performance.function_timeout` is set, this outlasts a download,
    /// which runs the media tool twice under `downloader.timeout_secs` each,
    /// and is never shorter than `performance.write_timeout`.
    pub fn function_timeout(&self) -> Duration {
        let secs = self.performance.function_timeout.unwrap_or_else(|| {
            let download = self
                .downloader
                .timeout_secs
                .saturating_mul(2)
                .saturating_add(FUNCTION_TIMEOUT_MARGIN_SECS);
            download.max(self.performance.write_timeout)
        });
        Duration::from_secs(secs)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ConfigError::Address { addr, source })
    }
}
