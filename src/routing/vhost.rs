//! Virtual host and prefix rules
//!
//! Each rule pairs a matcher (reserved host name or URL prefix) with the
//! subdirectory of the root it redirects into. Rules are evaluated in the
//! order they are listed; the first hit wins.

/// Domain under which the reserved virtual hosts live
pub const DEFAULT_DOMAIN: &str = "transient.optgeo.org";

/// Subdirectory holding the merged datasets
pub const DATA_DIR: &str = "data";

/// Subdirectory holding the per-part tiles
pub const PARTS_DIR: &str = "parts";

/// What a rule looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Exact host name, compared after the port is stripped
    Host(String),
    /// URL path prefix, matching `prefix` itself or `prefix/...`
    Prefix(String),
}

/// One link of the resolution chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub matcher: Matcher,
    /// Subdirectory of the root the remainder of the path is joined under
    pub subdir: String,
}

impl RouteRule {
    pub fn host(name: impl Into<String>, subdir: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Host(name.into()),
            subdir: subdir.into(),
        }
    }

    pub fn prefix(prefix: impl Into<String>, subdir: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Prefix(prefix.into()),
            subdir: subdir.into(),
        }
    }

    /// Return the part of `path` left to join under `subdir`, or `None` if
    /// the rule does not apply.
    ///
    /// `host` must already have its port stripped.
    pub fn match_request<'p>(&self, host: &str, path: &'p str) -> Option<&'p str> {
        match &self.matcher {
            Matcher::Host(name) => (host == name).then(|| path.trim_start_matches('/')),
            Matcher::Prefix(prefix) => match_prefix(prefix, path),
        }
    }
}

/// `/data` matches `/data` and `/data/...` but not `/database`
fn match_prefix<'p>(prefix: &str, path: &'p str) -> Option<&'p str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix('/')
}

/// The built-in chain: reserved hosts first, then path prefixes.
pub fn builtin_rules(domain: &str) -> Vec<RouteRule> {
    vec![
        RouteRule::host(format!("{DATA_DIR}.{domain}"), DATA_DIR),
        RouteRule::host(format!("{PARTS_DIR}.{domain}"), PARTS_DIR),
        RouteRule::prefix(format!("/{DATA_DIR}"), DATA_DIR),
        RouteRule::prefix(format!("/{PARTS_DIR}"), PARTS_DIR),
    ]
}

/// Strip port from host if present (e.g., "example.com:8080" -> "example.com")
pub fn strip_port(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("data.transient.optgeo.org:8000"), "data.transient.optgeo.org");
        assert_eq!(strip_port("localhost"), "localhost");
        assert_eq!(strip_port(""), "");
    }

    #[test]
    fn test_host_rule_strips_leading_slashes() {
        let rule = RouteRule::host("data.transient.optgeo.org", "data");
        assert_eq!(
            rule.match_request("data.transient.optgeo.org", "/tile1.fgb"),
            Some("tile1.fgb")
        );
        assert_eq!(
            rule.match_request("data.transient.optgeo.org", "//a/b.fgb"),
            Some("a/b.fgb")
        );
        assert_eq!(rule.match_request("parts.transient.optgeo.org", "/x"), None);
    }

    #[test]
    fn test_prefix_rule_boundaries() {
        let rule = RouteRule::prefix("/data", "data");
        assert_eq!(rule.match_request("", "/data"), Some(""));
        assert_eq!(rule.match_request("", "/data/"), Some(""));
        assert_eq!(rule.match_request("", "/data/a/b.fgb"), Some("a/b.fgb"));
        assert_eq!(rule.match_request("", "/database/x"), None);
        assert_eq!(rule.match_request("", "/parts/0.fgb"), None);
    }

    #[test]
    fn test_builtin_rule_order() {
        let rules = builtin_rules(DEFAULT_DOMAIN);
        assert_eq!(rules.len(), 4);
        assert_eq!(
            rules[0].matcher,
            Matcher::Host("data.transient.optgeo.org".to_string())
        );
        assert_eq!(
            rules[1].matcher,
            Matcher::Host("parts.transient.optgeo.org".to_string())
        );
        assert_eq!(rules[2].matcher, Matcher::Prefix("/data".to_string()));
        assert_eq!(rules[3].matcher, Matcher::Prefix("/parts".to_string()));
    }
}
