//! Static file serving module
//!
//! Serves destinations owned by a static build from the project tree, with
//! index files for directories.

use hyper::body::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::handler::router::RequestContext;
use crate::http::cache::CachePolicy;
use crate::http::response::{self, SendFile};
use crate::http::{mime, HttpResponse};

/// Serve a project-relative destination
pub async fn serve(
    ctx: &RequestContext<'_>,
    root: &Path,
    relative: &str,
    index_files: &[String],
) -> HttpResponse {
    match load(root, relative, index_files).await {
        Some((content, content_type)) => response::send_file(
            Bytes::from(content),
            &SendFile {
                content_type,
                policy: CachePolicy::STATIC,
                if_none_match: ctx.if_none_match,
                range: ctx.range_header,
                is_head: ctx.is_head,
                attachment: None,
            },
        ),
        None => {
            tracing::debug!(path = %ctx.path, relative, "static file not found");
            response::not_found()
        }
    }
}

/// Load a file under `root`, trying index files for directories
pub async fn load(
    root: &Path,
    relative: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    let root_canonical = match root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "project root not found or inaccessible");
            return None;
        }
    };

    let mut file_path = root.join(relative.trim_start_matches('/'));
    if relative.is_empty() || relative.ends_with('/') || is_dir(&file_path).await {
        file_path = find_index(&file_path, index_files).await?;
    }

    // File not found is common (404), no need to log at warning level
    let file_canonical = file_path.canonicalize().ok()?;
    if !file_canonical.starts_with(&root_canonical) {
        tracing::warn!(
            relative,
            resolved = %file_canonical.display(),
            "path traversal attempt blocked"
        );
        return None;
    }

    let content = match fs::read(&file_canonical).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(file = %file_path.display(), error = %e, "failed to read file");
            return None;
        }
    };

    Some((content, mime::content_type_for(&file_path)))
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

async fn find_index(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    for name in index_files {
        let candidate = dir.join(name);
        if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Some(candidate);
        }
    }
    None
}
