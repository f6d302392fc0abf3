//! HTTP cache control module
//!
//! Provides `ETag` generation, conditional request handling and the
//! `Cache-Control` policies used by each kind of response.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a strong `ETag` from content length and hash, e.g. `"1a2-9f0c3e"`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}-{:x}\"", content.len(), hasher.finish())
}

/// `ETag` from file length and modification time, e.g. `"1a2-17c9e0f5a3b"`.
///
/// Used for files streamed from disk, whose content is not read up front.
pub fn metadata_etag(len: u64, modified: Option<SystemTime>) -> String {
    let mtime = modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos());
    format!("\"{len:x}-{mtime:x}\"")
}

/// Whether `If-None-Match` names the current `ETag` (list or `*`)
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client| {
        client.split(',').map(str::trim).any(|e| {
            // Weak comparison: a W/ prefix does not prevent a match
            e == "*" || e.strip_prefix("W/").unwrap_or(e) == etag
        })
    })
}

/// Cache control policy per response kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Static build output
    Public(u32),
    /// Function output
    NoCache,
    /// Downloaded media, never stored by intermediaries
    NoStore,
}

impl CachePolicy {
    /// Static files are cached for an hour
    pub const STATIC: Self = Self::Public(3600);

    pub fn header_value(self) -> String {
        match self {
            Self::Public(max_age) => format!("public, max-age={max_age}"),
            Self::NoCache => "no-cache".to_string(),
            Self::NoStore => "no-store".to_string(),
        }
    }
}
