//! Download manifest generator
//!
//! Lists every `*.fgb` under `parts/` and `data/` as a Markdown document with
//! size, last-modified time and coordinate reference system. Sizes and dates
//! come from a `HEAD` probe against the public host when reachable, otherwise
//! from the local files. The CRS is read with GDAL's `ogrinfo`.

use super::write_atomic;
use crate::error::BatchError;
use crate::http::cache::http_date;
use crate::logger;
use crate::routing::{DATA_DIR, PARTS_DIR};
use regex_automata::meta::Regex;
use reqwest::header::{HeaderName, CONTENT_LENGTH, LAST_MODIFIED};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub const DEFAULT_BASE_URL: &str = "https://transient.optgeo.org";
pub const MANIFEST_FILE: &str = "DOWNLOADABLE.md";
pub const PROBE_USER_AGENT: &str = "terrain2021-generator/1.0";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(8);

/// Files above this size get the cheaper `ogrinfo -so` summary
const FULL_SUMMARY_LIMIT: u64 = 50 * 1024 * 1024;
const OGRINFO_TIMEOUT: Duration = Duration::from_secs(20);
const UNKNOWN: &str = "unknown";

/// Lines mentioning any of these describe a CRS without an EPSG code
const CRS_LINE_MARKERS: [&str; 6] = [
    "PROJCRS",
    "PROJCS",
    "GEOGCS",
    "Coordinate System is",
    "WGS 84",
    "Lambert",
];

/// Which served tree a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Parts,
    Data,
}

impl Group {
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Parts => PARTS_DIR,
            Self::Data => DATA_DIR,
        }
    }
}

/// Coordinate reference system as far as it could be determined
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Crs {
    /// `EPSG:n`, or a descriptive line from the `ogrinfo` summary
    Known(String),
    /// Borrowed from the most common CRS among `parts` files
    Inferred(String),
    Unknown,
    /// `ogrinfo` could not be run or timed out
    ToolUnavailable,
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(crs) => f.write_str(crs),
            Self::Inferred(crs) => write!(f, "inferred:{crs}"),
            Self::Unknown => f.write_str(UNKNOWN),
            Self::ToolUnavailable => f.write_str("ogrinfo-unavailable"),
        }
    }
}

/// One manifest bullet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub group: Group,
    pub name: String,
    pub url: String,
    /// Human-readable size, or `unknown`
    pub size: String,
    /// HTTP-date, or `unknown`
    pub last_modified: String,
    pub crs: Crs,
}

#[derive(Debug, Clone)]
pub struct ManifestOptions {
    pub root: PathBuf,
    pub base_url: String,
    pub output: PathBuf,
    /// Send `HEAD` requests to `base_url`; local metadata only when false
    pub probe: bool,
    pub probe_timeout: Duration,
}

impl ManifestOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            output: root.join(MANIFEST_FILE),
            root,
            base_url: DEFAULT_BASE_URL.to_string(),
            probe: true,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// `*.fgb` files to list: `parts/` with numeric stems first in numeric
/// order then the rest by name, followed by `data/` by name. A missing tree
/// is skipped; an unreadable root is an error.
pub fn collect_files(root: &Path) -> Result<Vec<(Group, String)>, BatchError> {
    let read_err = |source| BatchError::Read {
        path: root.to_path_buf(),
        source,
    };
    if !fs::metadata(root).map_err(read_err)?.is_dir() {
        return Err(read_err(std::io::Error::from(
            std::io::ErrorKind::NotADirectory,
        )));
    }

    let mut files = Vec::new();

    let mut parts = list_fgb(&root.join(PARTS_DIR))?;
    parts.sort_by_cached_key(|name| parts_sort_key(name));
    files.extend(parts.into_iter().map(|n| (Group::Parts, n)));

    let mut data = list_fgb(&root.join(DATA_DIR))?;
    data.sort();
    files.extend(data.into_iter().map(|n| (Group::Data, n)));

    Ok(files)
}

fn list_fgb(dir: &Path) -> Result<Vec<String>, BatchError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|source| BatchError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(entries
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".fgb"))
        .collect())
}

/// `(0, n, "")` for numeric stems, `(1, 0, stem)` for the rest
fn parts_sort_key(name: &str) -> (u8, u128, String) {
    let stem = Path::new(name)
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = stem.parse::<u128>() {
            return (0, n, String::new());
        }
    }
    (1, 0, stem)
}

/// `1536` -> `1KiB`; each step divides by 1024, dropping the remainder
pub fn format_size(bytes: u64) -> String {
    let mut n = bytes;
    for unit in ["B", "KiB", "MiB", "GiB", "TiB"] {
        if n < 1024 {
            return format!("{n}{unit}");
        }
        n /= 1024;
    }
    format!("{n}PiB")
}

/// Size and last-modified as reported by the server, if it answered
async fn probe_head(client: &reqwest::Client, url: &str) -> (Option<String>, Option<String>) {
    let response = match client.head(url).send().await {
        Ok(r) => r,
        Err(e) => {
            logger::log_debug(&format!("HEAD {url} failed: {e}"));
            return (None, None);
        }
    };
    if !response.status().is_success() {
        logger::log_debug(&format!("HEAD {url} returned {}", response.status()));
        return (None, None);
    }
    let header = |name: HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };
    (header(CONTENT_LENGTH), header(LAST_MODIFIED))
}

fn stat_local(path: &Path) -> (Option<String>, Option<String>) {
    let Ok(metadata) = fs::metadata(path) else {
        return (None, None);
    };
    let modified = metadata.modified().ok().map(http_date);
    (Some(metadata.len().to_string()), modified)
}

/// Digits become a human size; anything else is passed through
fn humanize(size: Option<&str>) -> String {
    match size {
        Some(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
            .parse::<u64>()
            .map_or_else(|_| s.to_string(), format_size),
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Extracts a CRS from `ogrinfo` summaries
pub struct CrsExtractor {
    patterns: [Regex; 3],
}

impl CrsExtractor {
    pub fn new() -> Result<Self, BatchError> {
        Ok(Self {
            patterns: [
                Regex::new(r#"(?i)AUTHORITY\s*\[\s*["']?EPSG["']?\s*,\s*["']([0-9]{3,6})["']\s*\]"#)?,
                Regex::new(r#"(?i)ID\s*\[\s*["']?EPSG["']?\s*,\s*["']?([0-9]{3,6})["']?\s*\]"#)?,
                Regex::new(r#"(?i)(?-u:\b)EPSG\s*[:=\s]\s*["']?([0-9]{3,6})"#)?,
            ],
        })
    }

    /// First EPSG code by pattern priority, else the first descriptive line
    pub fn parse(&self, summary: &str) -> Crs {
        for regex in &self.patterns {
            let mut caps = regex.create_captures();
            regex.captures(summary, &mut caps);
            if let Some(span) = caps.get_group(1) {
                return Crs::Known(format!("EPSG:{}", &summary[span.range()]));
            }
        }

        summary
            .lines()
            .find(|line| CRS_LINE_MARKERS.iter().any(|m| line.contains(m)))
            .map_or(Crs::Unknown, |line| Crs::Known(line.trim().to_string()))
    }

    /// Run `ogrinfo` on `path` and parse its output
    pub async fn extract(&self, path: &Path) -> Crs {
        let full = fs::metadata(path).is_ok_and(|m| m.len() <= FULL_SUMMARY_LIMIT);
        let mut cmd = Command::new("ogrinfo");
        if full {
            cmd.arg("-al");
        }
        cmd.arg("-so")
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(OGRINFO_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                logger::log_debug(&format!("ogrinfo failed for {}: {e}", path.display()));
                return Crs::ToolUnavailable;
            }
            Err(_) => {
                logger::log_warning(&format!("ogrinfo timed out for {}", path.display()));
                return Crs::ToolUnavailable;
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        self.parse(&text)
    }
}

/// Most frequent known CRS; ties go to the one seen first
pub fn most_common_crs<'a>(crs: impl IntoIterator<Item = &'a Crs>) -> Option<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (order, crs) in crs.into_iter().enumerate() {
        if let Crs::Known(value) = crs {
            counts.entry(value.as_str()).or_insert((0, order)).0 += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value.to_string())
}

/// Replace unknown `data` CRS values with the dominant `parts` CRS
pub fn infer_data_crs(entries: &mut [ManifestEntry]) {
    let parts_mode = most_common_crs(
        entries
            .iter()
            .filter(|e| e.group == Group::Parts)
            .map(|e| &e.crs),
    );
    let Some(mode) = parts_mode else {
        return;
    };
    for entry in entries
        .iter_mut()
        .filter(|e| e.group == Group::Data && e.crs == Crs::Unknown)
    {
        entry.crs = Crs::Inferred(mode.clone());
    }
}

/// Markdown document for the collected entries
pub fn render(entries: &[ManifestEntry]) -> String {
    let mut lines = vec![
        "# Downloadable files".to_string(),
        String::new(),
        "Below is a generated list of FlatGeobuf files (paths point to transient.optgeo.org)."
            .to_string(),
        String::new(),
    ];

    let mut current = None;
    for entry in entries {
        if current != Some(entry.group) {
            lines.push(format!("## {}", entry.group.dir_name()));
            lines.push(String::new());
            current = Some(entry.group);
        }
        lines.push(format!(
            "- [{}/{}]({}) - {}, last-modified: {}, CRS: {}",
            entry.group.dir_name(),
            entry.name,
            entry.url,
            entry.size,
            entry.last_modified,
            entry.crs
        ));
        lines.push(String::new());
    }

    lines.push(
        "Note: availability depends on the tunnel/server and Cloudflare; \
         use `curl -I` / `curl -X OPTIONS` for quick checks."
            .to_string(),
    );

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Build the manifest entries for everything under `options.root`
pub async fn build_entries(options: &ManifestOptions) -> Result<Vec<ManifestEntry>, BatchError> {
    let files = collect_files(&options.root)?;
    let extractor = CrsExtractor::new()?;
    let client = reqwest::Client::builder()
        .user_agent(PROBE_USER_AGENT)
        .timeout(options.probe_timeout)
        .build()?;
    let base_url = options.base_url.trim_end_matches('/');

    let mut entries = Vec::with_capacity(files.len());
    for (group, name) in files {
        let url = format!("{base_url}/{}/{name}", group.dir_name());
        let local_path = options.root.join(group.dir_name()).join(&name);

        let (mut size, mut last_modified) = if options.probe {
            probe_head(&client, &url).await
        } else {
            (None, None)
        };
        if size.is_none() {
            (size, last_modified) = stat_local(&local_path);
        }

        let crs = extractor.extract(&local_path).await;
        logger::log_debug(&format!("{url}: size={size:?} crs={crs}"));

        entries.push(ManifestEntry {
            group,
            name,
            url,
            size: humanize(size.as_deref()),
            last_modified: last_modified.unwrap_or_else(|| UNKNOWN.to_string()),
            crs,
        });
    }

    infer_data_crs(&mut entries);
    Ok(entries)
}

/// Generate the manifest and write it to `options.output`. Returns the
/// number of files listed.
pub async fn run(options: &ManifestOptions) -> Result<usize, BatchError> {
    let entries = build_entries(options).await?;
    write_atomic(&options.output, &render(&entries))?;
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(group: Group, name: &str, crs: Crs) -> ManifestEntry {
        ManifestEntry {
            group,
            name: name.to_string(),
            url: format!("https://transient.optgeo.org/{}/{name}", group.dir_name()),
            size: "1KiB".to_string(),
            last_modified: "Sun, 06 Nov 1994 08:49:37 GMT".to_string(),
            crs,
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0B");
        assert_eq!(format_size(1023), "1023B");
        assert_eq!(format_size(1536), "1KiB");
        assert_eq!(format_size(5 * 1024 * 1024 + 7), "5MiB");
        assert_eq!(format_size(3 * 1024_u64.pow(4)), "3TiB");
        assert_eq!(format_size(2048 * 1024_u64.pow(5)), "2048PiB");
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(Some("2048")), "2KiB");
        assert_eq!(humanize(Some("n/a")), "n/a");
        assert_eq!(humanize(None), "unknown");
    }

    #[test]
    fn test_collect_files_order() {
        let root = TempDir::new().unwrap();
        let parts = root.path().join("parts");
        let data = root.path().join("data");
        fs::create_dir_all(&parts).unwrap();
        fs::create_dir_all(&data).unwrap();
        for name in ["10.fgb", "2.fgb", "extra.fgb", "1.fgb", "notes.txt"] {
            fs::write(parts.join(name), b"").unwrap();
        }
        for name in ["b.fgb", "a.fgb"] {
            fs::write(data.join(name), b"").unwrap();
        }

        let files = collect_files(root.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|(g, n)| format!("{}/{n}", g.dir_name()))
            .collect();
        assert_eq!(
            names,
            vec![
                "parts/1.fgb",
                "parts/2.fgb",
                "parts/10.fgb",
                "parts/extra.fgb",
                "data/a.fgb",
                "data/b.fgb"
            ]
        );
    }

    #[test]
    fn test_collect_files_missing_root() {
        let root = TempDir::new().unwrap();
        let err = collect_files(&root.path().join("nope")).unwrap_err();
        assert!(matches!(err, BatchError::Read { .. }));
    }

    #[test]
    fn test_crs_pattern_priority() {
        let extractor = CrsExtractor::new().unwrap();
        let wkt1 = r#"PROJCS["JGD2011", AUTHORITY["EPSG","6677"]] EPSG:4326"#;
        assert_eq!(extractor.parse(wkt1), Crs::Known("EPSG:6677".to_string()));

        let wkt2 = r#"PROJCRS["JGD2011 / Japan Plane Rectangular CS IX", ID["EPSG",6677]]"#;
        assert_eq!(extractor.parse(wkt2), Crs::Known("EPSG:6677".to_string()));

        assert_eq!(
            extractor.parse("Layer SRS: epsg:3857"),
            Crs::Known("EPSG:3857".to_string())
        );
    }

    #[test]
    fn test_crs_descriptive_line_fallback() {
        let extractor = CrsExtractor::new().unwrap();
        let summary = "INFO: Open of `x.fgb'\nLayer SRS WKT:\n  GEOGCS[\"WGS 84\"]  \n";
        assert_eq!(
            extractor.parse(summary),
            Crs::Known("GEOGCS[\"WGS 84\"]".to_string())
        );
        assert_eq!(extractor.parse("Feature Count: 3"), Crs::Unknown);
    }

    #[test]
    fn test_crs_display() {
        assert_eq!(Crs::Inferred("EPSG:6677".into()).to_string(), "inferred:EPSG:6677");
        assert_eq!(Crs::ToolUnavailable.to_string(), "ogrinfo-unavailable");
        assert_eq!(Crs::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_infer_data_crs_uses_parts_mode() {
        let mut entries = vec![
            entry(Group::Parts, "0.fgb", Crs::Known("EPSG:6677".into())),
            entry(Group::Parts, "1.fgb", Crs::Known("EPSG:4326".into())),
            entry(Group::Parts, "2.fgb", Crs::Known("EPSG:6677".into())),
            entry(Group::Parts, "3.fgb", Crs::ToolUnavailable),
            entry(Group::Data, "a.fgb", Crs::Unknown),
            entry(Group::Data, "b.fgb", Crs::Known("EPSG:3857".into())),
        ];
        infer_data_crs(&mut entries);
        assert_eq!(entries[4].crs, Crs::Inferred("EPSG:6677".into()));
        assert_eq!(entries[5].crs, Crs::Known("EPSG:3857".into()));
    }

    #[test]
    fn test_most_common_tie_goes_to_first_seen() {
        let crs = [Crs::Known("B".into()), Crs::Known("A".into())];
        assert_eq!(most_common_crs(&crs).as_deref(), Some("B"));
        assert_eq!(most_common_crs(&[Crs::Unknown]), None);
    }

    #[test]
    fn test_render_groups() {
        let entries = vec![
            entry(Group::Parts, "0.fgb", Crs::Known("EPSG:6677".into())),
            entry(Group::Data, "a.fgb", Crs::Inferred("EPSG:6677".into())),
        ];
        let md = render(&entries);
        assert!(md.starts_with("# Downloadable files\n\n"));
        assert!(md.contains("## parts\n\n- [parts/0.fgb](https://transient.optgeo.org/parts/0.fgb) - 1KiB, last-modified: Sun, 06 Nov 1994 08:49:37 GMT, CRS: EPSG:6677\n"));
        assert!(md.contains("## data\n\n- [data/a.fgb]"));
        assert!(md.contains("CRS: inferred:EPSG:6677"));
        assert!(md.ends_with("for quick checks.\n"));
    }

    #[tokio::test]
    async fn test_run_without_probe_uses_local_metadata() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("parts")).unwrap();
        fs::write(root.path().join("parts/0.fgb"), vec![0_u8; 2048]).unwrap();

        let mut options = ManifestOptions::new(root.path());
        options.probe = false;
        assert_eq!(run(&options).await.unwrap(), 1);

        let md = fs::read_to_string(root.path().join("DOWNLOADABLE.md")).unwrap();
        assert!(md.contains("- [parts/0.fgb](https://transient.optgeo.org/parts/0.fgb) - 2KiB, last-modified: "));
        assert!(md.contains(" GMT, CRS: "));
    }
}
