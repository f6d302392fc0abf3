//! Media tool abstraction
//!
//! The downloader only needs two things from yt-dlp: the info document of a
//! URL and a download of one format to an output template.

use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use super::error::DownloadError;
use super::formats::VideoInfo;

#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Fetch metadata without downloading
    async fn probe(&self, url: &str) -> Result<VideoInfo, DownloadError>;

    /// Download `format_id` of `url`. `output` is a yt-dlp template such as
    /// `downloads/title.%(ext)s`.
    async fn fetch(&self, url: &str, format_id: &str, output: &Path) -> Result<(), DownloadError>;
}

/// The `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    timeout: Duration,
}

impl YtDlp {
    pub const fn new(program: String, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    async fn run(&self, cmd: &mut Command) -> Result<Output, DownloadError> {
        cmd.kill_on_drop(true);
        tracing::debug!(command = ?cmd, "running media tool");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| DownloadError::Timeout {
                program: self.program.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| DownloadError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DownloadError::Tool {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl MediaTool for YtDlp {
    async fn probe(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-J", "--no-warnings", "--no-playlist", "--"]).arg(url);
        let output = self.run(&mut cmd).await?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn fetch(&self, url: &str, format_id: &str, output: &Path) -> Result<(), DownloadError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["--no-warnings", "--no-playlist", "-f", format_id, "-o"])
            .arg(output)
            .arg("--")
            .arg(url);
        self.run(&mut cmd).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let tool = YtDlp::new(
            "definitely-not-an-installed-program".to_string(),
            Duration::from_secs(5),
        );
        let err = tool.probe("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, DownloadError::Spawn { .. }));
    }
}
