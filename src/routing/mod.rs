//! Routing module
//!
//! Maps an incoming request (host header + path) onto a file under the
//! served root:
//! - Virtual host matching based on the Host header
//! - Path prefix matching for local use without DNS
//! - Fallback translation straight against the root directory

mod resolver;
mod vhost;

pub use resolver::{normalize, percent_decode, PathResolver, Resolution, ResolvedTarget};
pub use vhost::{builtin_rules, strip_port, Matcher, RouteRule, DATA_DIR, DEFAULT_DOMAIN, PARTS_DIR};
