//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! routing and CORS decisions made by the handler.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, RangeParseResult, RangeRequest};
pub use response::{
    build_304_response, build_404_response, build_416_response, build_500_response,
    build_501_response, build_html_response, build_options_response, build_redirect_response,
    empty, full, ResponseBody,
};
