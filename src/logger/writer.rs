//! Access log writer module
//!
//! Writes formatted access log lines to stdout or an append-only file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use super::format::AccessLogEntry;

/// Log output target
enum LogTarget {
    Stdout,
    File(File),
}

/// Thread-safe access log sink
pub struct AccessLog {
    format: String,
    target: Mutex<LogTarget>,
}

impl AccessLog {
    /// Open the access log; `None` writes to stdout
    pub fn open(path: Option<&str>, format: &str) -> io::Result<Self> {
        let target = match path {
            Some(p) => LogTarget::File(open_log_file(p)?),
            None => LogTarget::Stdout,
        };
        Ok(Self {
            format: format.to_string(),
            target: Mutex::new(target),
        })
    }

    /// Write to stdout in the given format
    pub fn stdout(format: &str) -> Self {
        Self {
            format: format.to_string(),
            target: Mutex::new(LogTarget::Stdout),
        }
    }

    pub fn write(&self, entry: &AccessLogEntry) {
        let line = entry.format(&self.format);
        // A poisoned lock only means another writer panicked mid-line
        let mut target = match self.target.lock() {
            Ok(t) => t,
            Err(poisoned) => poisoned.into_inner(),
        };
        match &mut *target {
            LogTarget::Stdout => println!("{line}"),
            LogTarget::File(f) => {
                if let Err(e) = writeln!(f, "{line}") {
                    tracing::warn!(error = %e, "failed to write access log line");
                }
            }
        }
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}
