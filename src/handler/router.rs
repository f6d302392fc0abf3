//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method and size checks, manifest
//! resolution, then static serving or function invocation.

use hyper::body::Body;
use hyper::header::{self, HeaderMap};
use hyper::http::request::Parts;
use hyper::{Method, Request, StatusCode, Version};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::deployment::Dispatch;
use crate::handler::function::FunctionRequest;
use crate::handler::static_files;
use crate::http::{response, HttpResponse};
use crate::logger::AccessLogEntry;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Percent-decoded request path
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub range_header: Option<&'a str>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote: Option<SocketAddr>,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();
    // Only GET and HEAD are routed, so the body is never read
    let (parts, _) = req.into_parts();

    let (mut resp, route) = respond(&parts, &state).await;
    response::apply_server_name(&mut resp, &state.config.http.server_name);

    if state.config.logging.access_log {
        let mut entry = access_entry(&parts, remote);
        entry.status = resp.status().as_u16();
        entry.body_bytes = body_bytes(&resp);
        entry.route = route;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        state.access_log.write(&entry);
    }

    Ok(resp)
}

/// Produce the response and the index of the route that matched, if any
async fn respond(req: &Parts, state: &AppState) -> (HttpResponse, Option<usize>) {
    let method = &req.method;

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(method, state.config.http.enable_cors) {
        return (resp, None);
    }

    // 2. Check body size
    if let Some(resp) = check_body_size(&req.headers, state.config.http.max_body_size) {
        return (resp, None);
    }

    // 3. Resolve against the current deployment
    let path = percent_decode_str(req.uri.path()).decode_utf8_lossy();
    let deployment = state.deployment().await;
    let dispatch = deployment.dispatch(&path);
    let route = dispatch.route_index();

    let resp = match dispatch {
        Dispatch::Static { relative, .. } => {
            let ctx = RequestContext {
                path: &path,
                is_head: *method == Method::HEAD,
                if_none_match: header_str(&req.headers, &header::IF_NONE_MATCH),
                range_header: header_str(&req.headers, &header::RANGE),
            };
            static_files::serve(
                &ctx,
                deployment.root(),
                &relative,
                &state.config.project.index_files,
            )
            .await
        }
        Dispatch::Function {
            build_src,
            function_path,
            ..
        } => invoke_function(req, state, &path, &build_src, function_path).await,
        Dispatch::Unowned { destination, .. } => {
            tracing::debug!(path = %path, destination = %destination, "no build owns destination");
            response::not_found()
        }
        Dispatch::Refused { destination, .. } => {
            tracing::warn!(path = %path, destination = %destination, "destination escapes project root");
            response::not_found()
        }
        Dispatch::NoRoute => response::not_found(),
    };

    (resp, route)
}

async fn invoke_function(
    req: &Parts,
    state: &AppState,
    path: &str,
    build_src: &str,
    function_path: String,
) -> HttpResponse {
    let Some(handler) = state.functions.get(build_src) else {
        tracing::error!(src = %build_src, "no handler registered for function build");
        return response::json_error(
            StatusCode::BAD_GATEWAY,
            &format!("no handler registered for function '{build_src}'"),
        );
    };

    let base_path = path
        .strip_suffix(function_path.as_str())
        .unwrap_or_default()
        .to_string();
    let invocation = handler.invoke(FunctionRequest {
        method: req.method.clone(),
        path: function_path,
        base_path,
        query: req.uri.query().map(ToString::to_string),
        headers: req.headers.clone(),
    });

    let limit = state.config.function_timeout();
    let mut resp = match tokio::time::timeout(limit, invocation).await {
        Ok(resp) => resp,
        Err(_) => {
            // Dropping the invocation kills any media tool it started
            tracing::error!(src = %build_src, seconds = limit.as_secs(), "function timed out");
            response::json_error(StatusCode::GATEWAY_TIMEOUT, "Function timed out")
        }
    };

    if state.config.http.enable_cors {
        response::apply_cors(&mut resp);
    }
    resp
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<HttpResponse> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(response::options(enable_cors)),
        _ => {
            tracing::warn!(method = %method, "method not allowed");
            Some(response::method_not_allowed())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<HttpResponse> {
    let value = headers.get(header::CONTENT_LENGTH)?;
    let Ok(size_str) = value.to_str() else {
        tracing::warn!("Content-Length header contains non-ASCII characters");
        return None;
    };
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            tracing::error!(size, max = max_body_size, "request body too large");
            Some(response::payload_too_large())
        }
        Ok(_) => None,
        Err(_) => {
            tracing::warn!(value = %size_str, "invalid Content-Length value, skipping size check");
            None
        }
    }
}

/// Bytes announced for the body; streamed files only know it from the header
fn body_bytes(resp: &HttpResponse) -> usize {
    resp.body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .or_else(|| {
            header_str(resp.headers(), &header::CONTENT_LENGTH).and_then(|v| v.parse().ok())
        })
        .unwrap_or(0)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn access_entry(req: &Parts, remote: Option<SocketAddr>) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote.map_or_else(|| "-".to_string(), |addr| addr.ip().to_string()),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = version_label(req.version).to_string();
    entry.referer = header_str(&req.headers, &header::REFERER).map(ToString::to_string);
    entry.user_agent = header_str(&req.headers, &header::USER_AGENT).map(ToString::to_string);
    entry
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
