//! Cross-origin policy module
//!
//! Decides which `Access-Control-*` headers a response carries. The policy is
//! fixed at start-up and handed to every request by reference.

use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, VARY,
};

const ALLOW_METHODS: &str = "GET, OPTIONS";
const ALLOW_HEADERS: &str = "Range, Accept, Content-Type";
const EXPOSE_HEADERS: &str = "Content-Range, Content-Length";

/// Process-wide CORS policy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CorsPolicy {
    /// No CORS headers at all
    #[default]
    Disabled,
    /// `Access-Control-Allow-Origin: *` on every response
    Wildcard,
    /// Echo the origin back only when the request's `Origin` equals it exactly
    SpecificOrigin(String),
}

impl CorsPolicy {
    /// Build the policy from the `--cors-origin` value.
    ///
    /// Omitted or empty means disabled, `*` means wildcard, anything else is
    /// taken as the single allowed origin.
    pub fn from_origin_arg(value: Option<&str>) -> Self {
        match value {
            None | Some("") => Self::Disabled,
            Some("*") => Self::Wildcard,
            Some(origin) => Self::SpecificOrigin(origin.to_string()),
        }
    }

    /// The `Access-Control-Allow-Origin` value for a request, if any.
    pub fn allowed_origin<'a>(&'a self, request_origin: Option<&'a str>) -> Option<&'a str> {
        match self {
            Self::Disabled => None,
            Self::Wildcard => Some("*"),
            Self::SpecificOrigin(allowed) => {
                request_origin.filter(|origin| *origin == allowed.as_str())
            }
        }
    }

    /// Decorate outgoing response headers.
    ///
    /// A mismatched origin is not an error: the response simply goes out
    /// without CORS headers.
    pub fn apply(&self, request_origin: Option<&str>, headers: &mut HeaderMap) {
        if let Self::SpecificOrigin(_) = self {
            headers.append(VARY, HeaderValue::from_static("Origin"));
        }

        let Some(origin) = self.allowed_origin(request_origin) else {
            return;
        };
        let Ok(origin) = HeaderValue::from_str(origin) else {
            return;
        };

        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(EXPOSE_HEADERS),
        );
    }

    /// Short label for the start-up banner
    pub fn describe(&self) -> String {
        match self {
            Self::Disabled => "disabled".to_string(),
            Self::Wildcard => "*".to_string(),
            Self::SpecificOrigin(origin) => origin.clone(),
        }
    }
}
