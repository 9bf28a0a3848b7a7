//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, path
//! resolution, CORS headers and access logging.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use crate::routing::Resolution;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request path as sent, still percent-encoded
    pub path: String,
    pub query: Option<String>,
    /// `Host` header, or the authority of an absolute-form request target
    pub host: Option<String>,
    pub origin: Option<String>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let uri = req.uri();
        let headers = req.headers();
        Self {
            path: uri.path().to_string(),
            query: uri.query().map(ToString::to_string),
            host: header_string(headers, "host")
                .or_else(|| uri.authority().map(|a| a.as_str().to_string())),
            origin: header_string(headers, "origin"),
            is_head: req.method() == Method::HEAD,
            if_none_match: header_string(headers, "if-none-match"),
            if_modified_since: header_string(headers, "if-modified-since"),
            range_header: header_string(headers, "range"),
        }
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let ctx = RequestContext::from_request(&req);

    let mut response = dispatch(req.method(), &ctx, &state).await;
    state
        .config
        .cors
        .apply(ctx.origin.as_deref(), response.headers_mut());

    if state.config.logging.access_log {
        log_access(&req, &ctx, &state, peer, &response, started);
    }

    Ok(response)
}

/// Produce the response for one request, before CORS headers are added
async fn dispatch(
    method: &Method,
    ctx: &RequestContext,
    state: &AppState,
) -> Response<ResponseBody> {
    match *method {
        Method::GET | Method::HEAD => {}
        Method::OPTIONS => return http::build_options_response(),
        _ => {
            logger::log_debug(&format!("Method not implemented: {method}"));
            return http::build_501_response();
        }
    }

    match state.resolver.resolve(ctx.host.as_deref(), &ctx.path) {
        Resolution::Target(target) => static_files::serve_target(ctx, &target).await,
        Resolution::Escaped { attempted, base } => {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {} (outside {})",
                ctx.path,
                attempted.display(),
                base.display()
            ));
            http::build_404_response()
        }
        Resolution::Invalid => {
            logger::log_debug(&format!("Rejected undecodable path: {}", ctx.path));
            http::build_404_response()
        }
    }
}

fn log_access<B>(
    req: &Request<B>,
    ctx: &RequestContext,
    state: &AppState,
    peer: SocketAddr,
    response: &Response<ResponseBody>,
    started: Instant,
) {
    let mut entry = AccessLogEntry::new(
        peer.ip().to_string(),
        req.method().to_string(),
        ctx.path.clone(),
    );
    entry.query.clone_from(&ctx.query);
    entry.host.clone_from(&ctx.host);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v: &HeaderValue| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    entry.referer = header_string(req.headers(), "referer");
    entry.user_agent = header_string(req.headers(), "user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}
