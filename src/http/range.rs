//! HTTP Range request parsing
//!
//! Single byte ranges only (RFC 7233). Large geodata clients such as
//! `FlatGeobuf` and `PMTiles` readers fetch headers and index pages this way.

/// Parsed byte range, resolved against a known file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    pub start: u64,
    /// Inclusive end; `None` means until end of file
    pub end: Option<u64>,
}

impl RangeRequest {
    /// Inclusive last byte position for a file of `file_size` bytes
    #[inline]
    pub fn end_position(&self, file_size: u64) -> u64 {
        self.end.unwrap_or_else(|| file_size.saturating_sub(1))
    }

    /// Number of bytes the range covers
    pub fn len(&self, file_size: u64) -> u64 {
        self.end_position(file_size).saturating_sub(self.start) + 1
    }

    /// `Content-Range` header value
    pub fn content_range(&self, file_size: u64) -> String {
        format!(
            "bytes {}-{}/{file_size}",
            self.start,
            self.end_position(file_size)
        )
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    Valid(RangeRequest),
    /// Answer with 416
    NotSatisfiable,
    /// No header, other unit, multi-range or malformed: serve the whole file
    None,
}

/// Parse a `Range` header against the file size
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
///
/// # Examples
/// ```
/// use transient_serve::http::range::{parse_range_header, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-99"), 1000);
/// assert!(matches!(result, RangeParseResult::Valid(_)));
///
/// let result = parse_range_header(None, 1000);
/// assert!(matches!(result, RangeParseResult::None));
/// ```
pub fn parse_range_header(range_header: Option<&str>, file_size: u64) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::None;
    };

    let Some(byte_range) = header.trim().strip_prefix("bytes=") else {
        return RangeParseResult::None;
    };

    if byte_range.contains(',') {
        return RangeParseResult::None;
    }

    let Some((start_str, end_str)) = byte_range.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        parse_suffix_range(end_str, file_size)
    } else {
        parse_standard_range(start_str, end_str, file_size)
    }
}

/// `-500`: the last 500 bytes
fn parse_suffix_range(suffix_str: &str, file_size: u64) -> RangeParseResult {
    let Ok(suffix) = suffix_str.parse::<u64>() else {
        return RangeParseResult::None;
    };

    if suffix == 0 || file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(RangeRequest {
        start: file_size.saturating_sub(suffix),
        end: Some(file_size - 1),
    })
}

/// `0-99` or `100-`
fn parse_standard_range(start_str: &str, end_str: &str, file_size: u64) -> RangeParseResult {
    let Ok(start) = start_str.parse::<u64>() else {
        return RangeParseResult::None;
    };

    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        None
    } else {
        let Ok(e) = end_str.parse::<u64>() else {
            return RangeParseResult::None;
        };
        if e < start {
            // Syntactically invalid per RFC 7233, header is ignored
            return RangeParseResult::None;
        }
        Some(e.min(file_size - 1))
    };

    RangeParseResult::Valid(RangeRequest { start, end })
}
