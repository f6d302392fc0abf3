//! Media downloader function
//!
//! Native stand-in for the project's Python backend. Endpoints, relative to
//! the function:
//! - `/` redirects to the downloader page
//! - `/info?url=` lists downloadable formats
//! - `/download?url=&format_id=` downloads one format and streams the file
//! - `/public/*` serves the project's `public/` directory

mod error;
pub mod formats;
mod tool;

pub use error::DownloadError;
pub use formats::{FormatSummary, InfoResponse, VideoInfo};
pub use tool::{MediaTool, YtDlp};

use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::{Method, StatusCode};
use std::path::PathBuf;

use crate::handler::function::{FunctionHandler, FunctionRequest};
use crate::handler::static_files;
use crate::http::cache::CachePolicy;
use crate::http::response::{self, SendFile};
use crate::http::{mime, HttpResponse};
use formats::{normalize_url, sanitize_title, MEDIA_EXTENSIONS};

/// Page the function root redirects to, under the function's own mount
pub const HOME_PAGE: &str = "/public/downloader.html";

/// Function-local prefix of the static mount
const STATIC_MOUNT: &str = "/public";

pub struct Downloader<T> {
    tool: T,
    download_dir: PathBuf,
    static_dir: Option<PathBuf>,
    index_files: Vec<String>,
}

impl<T: MediaTool> Downloader<T> {
    /// Create the handler; the download directory is created if missing
    pub fn new(tool: T, download_dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&download_dir)?;
        Ok(Self {
            tool,
            download_dir,
            static_dir: None,
            index_files: Vec::new(),
        })
    }

    /// Serve `dir` under `/public`, with `index_files` for directories
    #[must_use]
    pub fn with_static_dir(mut self, dir: PathBuf, index_files: Vec<String>) -> Self {
        self.static_dir = Some(dir);
        self.index_files = index_files;
        self
    }

    async fn info(&self, url: &str) -> HttpResponse {
        let url = normalize_url(url);
        match self.tool.probe(&url).await {
            Ok(info) => response::json(StatusCode::OK, &InfoResponse::from(info)),
            Err(e) => {
                tracing::error!(url = %url, error = %e, "media info lookup failed");
                response::json_error(StatusCode::BAD_REQUEST, &e.to_string())
            }
        }
    }

    async fn download(&self, req: &FunctionRequest, url: &str, format_id: &str) -> HttpResponse {
        let url = normalize_url(url);
        let path = match self.fetch(&url, format_id).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                tracing::error!(url = %url, format_id, "tool finished but no media file was written");
                return response::json_error(StatusCode::INTERNAL_SERVER_ERROR, "Download failed");
            }
            Err(e) => {
                tracing::error!(url = %url, format_id, error = %e, "download failed");
                return response::json_error(StatusCode::BAD_REQUEST, &e.to_string());
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let opts = SendFile {
            content_type: mime::content_type_for(&path),
            policy: CachePolicy::NoStore,
            if_none_match: req.header("if-none-match"),
            range: req.header("range"),
            is_head: req.method == Method::HEAD,
            attachment: Some(name.as_str()),
        };
        match response::stream_file(&path, &opts).await {
            Ok(resp) => {
                tracing::info!(url = %url, format_id, file = %path.display(), "download complete");
                resp
            }
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "failed to open downloaded file");
                response::json_error(StatusCode::INTERNAL_SERVER_ERROR, "Download failed")
            }
        }
    }

    /// Download, then locate the first file written for the known extensions
    async fn fetch(&self, url: &str, format_id: &str) -> Result<Option<PathBuf>, DownloadError> {
        let info = self.tool.probe(url).await?;
        let name = sanitize_title(info.title.as_deref().unwrap_or_default());
        let template = self.download_dir.join(format!("{name}.%(ext)s"));
        self.tool.fetch(url, format_id, &template).await?;

        for ext in MEDIA_EXTENSIONS {
            let path = self.download_dir.join(format!("{name}.{ext}"));
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => return Ok(Some(path)),
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(DownloadError::Read { path, source }),
            }
        }
        Ok(None)
    }

    async fn serve_static(&self, req: &FunctionRequest, relative: &str) -> HttpResponse {
        let Some(dir) = self.static_dir.as_deref() else {
            return not_found();
        };
        match static_files::load(dir, relative, &self.index_files).await {
            Some((content, content_type)) => response::send_file(
                Bytes::from(content),
                &SendFile {
                    content_type,
                    policy: CachePolicy::STATIC,
                    if_none_match: req.header("if-none-match"),
                    range: req.header("range"),
                    is_head: req.method == Method::HEAD,
                    attachment: None,
                },
            ),
            None => not_found(),
        }
    }
}

#[async_trait]
impl<T: MediaTool> FunctionHandler for Downloader<T> {
    async fn invoke(&self, req: FunctionRequest) -> HttpResponse {
        let params = QueryParams::parse(req.query.as_deref());
        match req.path.as_str() {
            "" | "/" => response::redirect(
                &format!("{}{HOME_PAGE}", req.base_path),
                StatusCode::FOUND,
            ),
            "/info" => match params.get("url") {
                Some(url) => self.info(url).await,
                None => missing("url"),
            },
            "/download" => match (params.get("url"), params.get("format_id")) {
                (Some(url), Some(format_id)) => self.download(&req, url, format_id).await,
                (None, _) => missing("url"),
                (_, None) => missing("format_id"),
            },
            path => match static_relative(path) {
                Some(relative) => self.serve_static(&req, relative).await,
                None => not_found(),
            },
        }
    }
}

/// Path below the static mount: `/public/a.css` → `a.css`; the mount itself is the empty path
fn static_relative(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(STATIC_MOUNT)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('/')
}

fn not_found() -> HttpResponse {
    response::json_error(StatusCode::NOT_FOUND, "Not Found")
}

fn missing(name: &str) -> HttpResponse {
    response::json_error(
        StatusCode::UNPROCESSABLE_ENTITY,
        &format!("missing query parameter: {name}"),
    )
}

/// Decoded query string pairs; the first occurrence of a key wins
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self(pairs)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
