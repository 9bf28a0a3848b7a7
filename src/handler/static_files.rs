//! Static file serving module
//!
//! Serves resolved targets: streamed files with validators and byte ranges,
//! directory redirects, index files and generated listings.

use crate::error::ServeError;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range::RangeParseResult, ResponseBody};
use crate::logger;
use crate::routing::{percent_decode, ResolvedTarget};
use crate::transfer::FileBody;
use http_body_util::BodyExt;
use hyper::Response;
use std::fs::Metadata;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tokio::fs;

/// Tried in order when a directory is requested
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Serve whatever the resolver pointed at
pub async fn serve_target(
    ctx: &RequestContext,
    target: &ResolvedTarget,
) -> Response<ResponseBody> {
    let metadata = match fs::metadata(&target.path).await {
        Ok(m) => m,
        Err(e) => return error_response(&ServeError::from_io(target.path.clone(), e)),
    };

    if metadata.is_dir() {
        if !target.trailing_slash {
            return http::build_redirect_response(&directory_location(ctx));
        }
        return serve_directory(ctx, &target.path).await;
    }

    // `/file.fgb/` names a directory that does not exist
    if target.trailing_slash {
        return http::build_404_response();
    }

    serve_file(ctx, &target.path, &metadata).await
}

/// Index file if present, otherwise a generated listing
pub async fn serve_directory(ctx: &RequestContext, dir: &Path) -> Response<ResponseBody> {
    for index in INDEX_FILES {
        let candidate = dir.join(index);
        if let Ok(metadata) = fs::metadata(&candidate).await {
            if metadata.is_file() {
                return serve_file(ctx, &candidate, &metadata).await;
            }
        }
    }

    match list_directory(dir).await {
        Ok(entries) => {
            let title = percent_decode(&ctx.path);
            http::build_html_response(render_listing(&title, &entries), ctx.is_head)
        }
        Err(e) => error_response(&ServeError::from_io(dir.to_path_buf(), e)),
    }
}

/// Serve a regular file with `ETag`, `Last-Modified` and Range support
pub async fn serve_file(
    ctx: &RequestContext,
    path: &Path,
    metadata: &Metadata,
) -> Response<ResponseBody> {
    let total_size = metadata.len();
    let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
    let etag = cache::generate_etag(total_size, modified);
    let last_modified = cache::http_date(modified);

    // If-None-Match takes precedence; If-Modified-Since only applies without it
    let not_modified = if ctx.if_none_match.is_some() {
        cache::check_etag_match(ctx.if_none_match.as_deref(), &etag)
    } else {
        cache::not_modified_since(ctx.if_modified_since.as_deref(), modified)
    };
    if not_modified {
        return http::build_304_response(&etag, &last_modified);
    }

    let content_type = mime::for_path(path);
    let (status, start, len, content_range) =
        match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
            RangeParseResult::Valid(range) => (
                206,
                range.start,
                range.len(total_size),
                Some(range.content_range(total_size)),
            ),
            RangeParseResult::NotSatisfiable => return http::build_416_response(total_size),
            RangeParseResult::None => (200, 0, total_size, None),
        };

    let body = if ctx.is_head {
        http::empty()
    } else {
        match FileBody::open_range(path, start, len).await {
            Ok(body) => body.boxed(),
            Err(e) => return error_response(&ServeError::from_io(path.to_path_buf(), e)),
        }
    };

    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("Content-Length", len)
        .header("Last-Modified", last_modified)
        .header("ETag", etag)
        .header("Accept-Ranges", "bytes");
    if let Some(content_range) = content_range {
        builder = builder.header("Content-Range", content_range);
    }

    builder.body(body).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build file response: {e}"));
        http::build_500_response()
    })
}

fn error_response(err: &ServeError) -> Response<ResponseBody> {
    match err {
        ServeError::NotFound(_) => http::build_404_response(),
        ServeError::Io { .. } => {
            logger::log_error(&err.to_string());
            http::build_500_response()
        }
    }
}

/// Original path with a trailing slash added; the query string is kept
fn directory_location(ctx: &RequestContext) -> String {
    match &ctx.query {
        Some(q) => format!("{}/?{q}", ctx.path),
        None => format!("{}/", ctx.path),
    }
}

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Directory entries sorted case-insensitively by name
pub async fn list_directory(dir: &Path) -> std::io::Result<Vec<ListingEntry>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }
    entries.sort_by_cached_key(|e| e.name.to_lowercase());
    Ok(entries)
}

/// HTML listing page; every name is escaped and every link percent-encoded
pub fn render_listing(title: &str, entries: &[ListingEntry]) -> String {
    let title = escape_html(title);
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Directory listing for {title}</title>\n</head>\n<body>\n\
         <h1>Directory listing for {title}</h1>\n<hr>\n<ul>\n"
    );
    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        html.push_str(&format!(
            "<li><a href=\"{}{suffix}\">{}{suffix}</a></li>\n",
            encode_href(&entry.name),
            escape_html(&entry.name)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode a single path segment for use in an `href`
fn encode_href(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
