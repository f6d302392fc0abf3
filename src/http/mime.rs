//! MIME type detection module
//!
//! Content types for static build output and downloaded media.

use std::path::Path;

const FALLBACK: &str = "application/octet-stream";

const TYPES: &[(&str, &str)] = &[
    // Documents served by the static build
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("mjs", "text/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("txt", "text/plain; charset=utf-8"),
    ("xml", "application/xml"),
    ("webmanifest", "application/manifest+json"),
    ("wasm", "application/wasm"),
    // Images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    // Fonts
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    // Media the downloader produces
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("m4a", "audio/mp4"),
    ("mp3", "audio/mpeg"),
];

/// Content type for a file extension, case-insensitive
pub fn content_type(extension: Option<&str>) -> &'static str {
    let Some(ext) = extension else {
        return FALLBACK;
    };
    TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map_or(FALLBACK, |(_, ty)| ty)
}

/// Content type for a path, from its extension
pub fn content_type_for(path: &Path) -> &'static str {
    content_type(path.extension().and_then(|e| e.to_str()))
}
