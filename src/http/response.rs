//! HTTP response building module
//!
//! Builders for the status codes the router and functions produce. A builder
//! failure is logged and degrades to an empty response instead of panicking.

use futures_util::stream;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::{self, HeaderValue};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::cache::{self, CachePolicy};
use super::range::{self, ByteRange, RangeOutcome};

/// Either a buffered body or a file streamed from disk
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;
pub type HttpResponse = Response<ResponseBody>;

const ALLOW: &str = "GET, HEAD, OPTIONS";

/// Largest frame read from disk at a time
pub const STREAM_CHUNK: usize = 64 * 1024;

fn full(body: Bytes) -> ResponseBody {
    Full::new(body).map_err(|never| match never {}).boxed_unsync()
}

fn finish(builder: Builder, body: Bytes, label: &str) -> HttpResponse {
    finish_body(builder, full(body), label)
}

fn finish_body(builder: Builder, body: ResponseBody, label: &str) -> HttpResponse {
    builder.body(body).unwrap_or_else(|e| {
        tracing::error!(response = label, error = %e, "failed to build response");
        Response::new(full(Bytes::new()))
    })
}

fn plain(status: StatusCode, text: &'static str) -> Builder {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CONTENT_LENGTH, text.len())
}

pub fn not_found() -> HttpResponse {
    let text = "404 Not Found";
    finish(
        plain(StatusCode::NOT_FOUND, text),
        Bytes::from_static(text.as_bytes()),
        "404",
    )
}

pub fn method_not_allowed() -> HttpResponse {
    let text = "405 Method Not Allowed";
    finish(
        plain(StatusCode::METHOD_NOT_ALLOWED, text).header(header::ALLOW, ALLOW),
        Bytes::from_static(text.as_bytes()),
        "405",
    )
}

pub fn payload_too_large() -> HttpResponse {
    let text = "413 Payload Too Large";
    finish(
        plain(StatusCode::PAYLOAD_TOO_LARGE, text),
        Bytes::from_static(text.as_bytes()),
        "413",
    )
}

/// Answer a preflight or plain OPTIONS request
pub fn options(enable_cors: bool) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(header::ALLOW, ALLOW);

    if enable_cors {
        builder = builder
            .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
            .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW)
            .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "*")
            .header(header::ACCESS_CONTROL_MAX_AGE, "86400");
    }

    finish(builder, Bytes::new(), "OPTIONS")
}

/// Redirect with the given 3xx status
pub fn redirect(target: &str, status: StatusCode) -> HttpResponse {
    finish(
        Response::builder()
            .status(status)
            .header(header::LOCATION, target)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        Bytes::from_static(b"Redirecting..."),
        "redirect",
    )
}

/// JSON body with the given status
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => finish(
            Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, bytes.len())
                .header(header::CACHE_CONTROL, CachePolicy::NoCache.header_value()),
            Bytes::from(bytes),
            "json",
        ),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize JSON response");
            finish(
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header(header::CONTENT_TYPE, "application/json"),
                Bytes::from_static(br#"{"error":"Internal server error"}"#),
                "500",
            )
        }
    }
}

/// `{"error": message}` with the given status
pub fn json_error(status: StatusCode, message: &str) -> HttpResponse {
    json(status, &serde_json::json!({ "error": message }))
}

/// Allow any origin to read the response
pub fn apply_cors(response: &mut HttpResponse) {
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}

/// Stamp the `Server` header
pub fn apply_server_name(response: &mut HttpResponse, name: &str) {
    if let Ok(value) = HeaderValue::from_str(name) {
        response.headers_mut().insert(header::SERVER, value);
    }
}

/// Options for sending a file body
#[derive(Debug, Clone, Copy)]
pub struct SendFile<'a> {
    pub content_type: &'a str,
    pub policy: CachePolicy,
    pub if_none_match: Option<&'a str>,
    pub range: Option<&'a str>,
    pub is_head: bool,
    /// Download name; sets `Content-Disposition: attachment`
    pub attachment: Option<&'a str>,
}

/// Send in-memory file content honoring `If-None-Match` and `Range`
pub fn send_file(data: Bytes, opts: &SendFile<'_>) -> HttpResponse {
    let etag = cache::generate_etag(&data);
    let (builder, range) = match prepare(data.len(), &etag, opts) {
        Ok(prepared) => prepared,
        Err(resp) => return resp,
    };

    let body = match range {
        _ if opts.is_head => Bytes::new(),
        Some(r) => data.slice(r.start..=r.end),
        None => data,
    };
    finish(builder, body, "file")
}

/// Stream a file from disk honoring `If-None-Match` and `Range`.
///
/// The file is read in chunks of at most [`STREAM_CHUNK`] bytes while the
/// body is polled, and the `ETag` comes from its metadata.
pub async fn stream_file(path: &Path, opts: &SendFile<'_>) -> io::Result<HttpResponse> {
    let mut file = File::open(path).await?;
    let metadata = file.metadata().await?;
    let total = usize::try_from(metadata.len()).map_err(io::Error::other)?;
    let etag = cache::metadata_etag(metadata.len(), metadata.modified().ok());

    let (builder, range) = match prepare(total, &etag, opts) {
        Ok(prepared) => prepared,
        Err(resp) => return Ok(resp),
    };
    if opts.is_head {
        return Ok(finish(builder, Bytes::new(), "file"));
    }

    let (start, count) = range.map_or((0, total), |r| (r.start, r.byte_count()));
    if start > 0 {
        file.seek(SeekFrom::Start(start as u64)).await?;
    }
    Ok(finish_body(builder, file_body(file, count as u64), "file"))
}

/// Status line and headers for a file of `total` bytes, or the complete
/// 304/416 response when no body follows
fn prepare(
    total: usize,
    etag: &str,
    opts: &SendFile<'_>,
) -> Result<(Builder, Option<ByteRange>), HttpResponse> {
    if cache::check_etag_match(opts.if_none_match, etag) {
        return Err(finish(
            Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .header(header::ETAG, etag)
                .header(header::CACHE_CONTROL, opts.policy.header_value()),
            Bytes::new(),
            "304",
        ));
    }

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, opts.content_type)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, opts.policy.header_value());
    if let Some(name) = opts.attachment {
        builder = builder.header(header::CONTENT_DISPOSITION, content_disposition(name));
    }

    match range::evaluate(opts.range, total) {
        RangeOutcome::Full => Ok((
            builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, total),
            None,
        )),
        RangeOutcome::Partial(r) => Ok((
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_LENGTH, r.byte_count())
                .header(header::CONTENT_RANGE, r.content_range(total)),
            Some(r),
        )),
        RangeOutcome::Unsatisfiable => Err(finish(
            plain(StatusCode::RANGE_NOT_SATISFIABLE, "Range Not Satisfiable")
                .header(header::CONTENT_RANGE, format!("bytes */{total}")),
            Bytes::from_static(b"Range Not Satisfiable"),
            "416",
        )),
    }
}

/// Body yielding the next `len` bytes of `file`
fn file_body(file: File, len: u64) -> ResponseBody {
    StreamBody::new(stream::try_unfold((file, len), next_chunk)).boxed_unsync()
}

async fn next_chunk(
    (mut file, remaining): (File, u64),
) -> io::Result<Option<(Frame<Bytes>, (File, u64))>> {
    if remaining == 0 {
        return Ok(None);
    }
    let want = usize::try_from(remaining).map_or(STREAM_CHUNK, |r| r.min(STREAM_CHUNK));
    let mut buf = vec![0; want];
    let read = file.read(&mut buf).await?;
    if read == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "file shrank while streaming",
        ));
    }
    buf.truncate(read);
    Ok(Some((Frame::data(Bytes::from(buf)), (file, remaining - read as u64))))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
fn content_disposition(name: &str) -> String {
    let ascii: String = name
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .filter(|c| *c != '"' && *c != '\\')
        .collect();
    let encoded = utf8_percent_encode(name, NON_ALPHANUMERIC);
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}
