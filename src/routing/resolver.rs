//! Path resolution module
//!
//! Turns `(Host, path)` into an absolute filesystem path under the root.
//! The rule chain from [`super::vhost`] is tried first; requests that match
//! no rule are translated directly against the root.

use super::vhost::{builtin_rules, strip_port, RouteRule, DEFAULT_DOMAIN};
use std::path::{Component, Path, PathBuf};

/// Where a request landed on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Normalized absolute path of the target
    pub path: PathBuf,
    /// Directory the target must stay within (the rule's subdirectory, or the root)
    pub base: PathBuf,
    /// Whether the decoded request path ended in `/`
    pub trailing_slash: bool,
}

/// Outcome of resolving one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Target(ResolvedTarget),
    /// The normalized path left the rule's subdirectory (`..` traversal)
    Escaped { attempted: PathBuf, base: PathBuf },
    /// The decoded path can never name a file (embedded NUL)
    Invalid,
}

/// Ordered rule chain plus the root it resolves against
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    rules: Vec<RouteRule>,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>, rules: Vec<RouteRule>) -> Self {
        Self {
            root: root.into(),
            rules,
        }
    }

    /// Resolver with the built-in `data`/`parts` host and prefix chain
    pub fn builtin(root: impl Into<PathBuf>) -> Self {
        Self::new(root, builtin_rules(DEFAULT_DOMAIN))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Resolve a request.
    ///
    /// `host` is the raw `Host` header value (a `:port` suffix is ignored);
    /// `raw_path` is the request path as sent, percent-encoded. Anything after
    /// `?` or `#` is ignored.
    pub fn resolve(&self, host: Option<&str>, raw_path: &str) -> Resolution {
        let raw_path = raw_path.split(['?', '#']).next().unwrap_or(raw_path);
        let path = percent_decode(raw_path);
        if path.contains('\0') {
            return Resolution::Invalid;
        }
        let host = host.map_or("", strip_port);
        let trailing_slash = path.ends_with('/');

        for rule in &self.rules {
            let Some(rest) = rule.match_request(host, &path) else {
                continue;
            };

            let base = self.root.join(&rule.subdir);
            let target = normalize(&join_segments(&base, rest));
            if !target.starts_with(&base) {
                return Resolution::Escaped {
                    attempted: target,
                    base,
                };
            }
            return Resolution::Target(ResolvedTarget {
                path: target,
                base,
                trailing_slash,
            });
        }

        Resolution::Target(ResolvedTarget {
            path: self.translate_default(&path),
            base: self.root.clone(),
            trailing_slash,
        })
    }

    /// Default translation: keep only plain segments, so the result can never
    /// leave the root.
    fn translate_default(&self, path: &str) -> PathBuf {
        let mut target = self.root.clone();
        for segment in path.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                continue;
            }
            target.push(segment);
        }
        target
    }
}

/// Append each `/`-separated segment of `rest` to `base`. Empty segments are
/// dropped so a doubled slash can never turn `rest` into an absolute path.
fn join_segments(base: &Path, rest: &str) -> PathBuf {
    let mut joined = base.to_path_buf();
    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        joined.push(segment);
    }
    joined
}

/// Lexically collapse `.`, `..` and redundant separators.
///
/// No filesystem access: symlinks are not followed.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Decode `%XX` escapes. Invalid UTF-8 is replaced, malformed escapes are
/// kept as-is and `+` is left alone.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
