// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub project: ProjectConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub downloader: DownloaderConfig,
    /// Native handlers standing in for function builds
    #[serde(default = "default_functions")]
    pub functions: Vec<FunctionBinding>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Project being served
#[derive(Debug, Deserialize, Clone)]
pub struct ProjectConfig {
    /// Directory that build sources are relative to
    pub root: PathBuf,
    /// Manifest path, relative to `root` unless absolute
    pub manifest: PathBuf,
    /// Files tried, in order, for directory destinations
    pub index_files: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds a function may take to respond; derived when unset
    #[serde(default)]
    pub function_timeout: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Media tool settings for the downloader function
#[derive(Debug, Deserialize, Clone)]
pub struct DownloaderConfig {
    /// Executable name or path of yt-dlp
    pub program: String,
    pub download_dir: PathBuf,
    pub timeout_secs: u64,
}

/// Binds a function build source to a native handler
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct FunctionBinding {
    /// Build `src` exactly as declared in the manifest
    pub src: String,
    /// Registered handler name
    pub handler: String,
}

fn default_functions() -> Vec<FunctionBinding> {
    vec![FunctionBinding {
        src: "api/backend.py".to_string(),
        handler: "downloader".to_string(),
    }]
}
