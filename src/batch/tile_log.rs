//! Tile-overflow log scanner
//!
//! Tiling tools warn when a tile exceeds the feature limit, with lines like
//! `tile 2/2/1 has 1535647 features, >1400000`. This job collects those
//! warnings into a sorted CSV so oversized tiles can be reviewed.

use super::write_atomic;
use crate::error::BatchError;
use regex_automata::meta::Regex;
use regex_automata::util::captures::Captures;
use std::fs;
use std::path::Path;

/// Where the CSV lands when no `--output` is given
pub const DEFAULT_OUTPUT: &str = "data/pmtiles_over_threshold_tiles.txt";

pub const CSV_HEADER: &str = "z,x,y,features,limit,log_line";

/// Written instead of a CSV when the log holds no warnings
pub const NO_MATCHES_SENTINEL: &str = "# no tiles over threshold\n";

const PATTERN: &str =
    r"(?i)tile\s+([0-9]+)/([0-9]+)/([0-9]+)\s+has\s+([0-9]+)\s+features,\s*>\s*([0-9]+)";

/// One oversized tile. Field order is the output sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TileHit {
    pub z: u64,
    pub x: u64,
    pub y: u64,
    pub features: u64,
    pub limit: u64,
    /// The log line, trimmed
    pub line: String,
}

impl TileHit {
    /// CSV row; commas in the log line are escaped as `\,`
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.z,
            self.x,
            self.y,
            self.features,
            self.limit,
            self.line.replace(',', "\\,")
        )
    }
}

pub struct TileLogScanner {
    regex: Regex,
}

impl TileLogScanner {
    pub fn new() -> Result<Self, BatchError> {
        Ok(Self {
            regex: Regex::new(PATTERN)?,
        })
    }

    /// Match one line; the warning may appear anywhere in it
    pub fn scan_line(&self, line: &str) -> Option<TileHit> {
        let mut caps = self.regex.create_captures();
        self.regex.captures(line, &mut caps);
        if !caps.is_match() {
            return None;
        }

        Some(TileHit {
            z: group_u64(&caps, line, 1)?,
            x: group_u64(&caps, line, 2)?,
            y: group_u64(&caps, line, 3)?,
            features: group_u64(&caps, line, 4)?,
            limit: group_u64(&caps, line, 5)?,
            line: line.trim().to_string(),
        })
    }

    /// Every warning in `text`, sorted.
    ///
    /// Lines end at `\n`, `\r\n` or a lone `\r`; progress meters rewrite
    /// their line with bare carriage returns.
    pub fn scan(&self, text: &str) -> Vec<TileHit> {
        let mut hits: Vec<TileHit> = text
            .split(['\n', '\r'])
            .filter(|l| !l.is_empty())
            .filter_map(|l| self.scan_line(l))
            .collect();
        hits.sort();
        hits
    }
}

fn group_u64(caps: &Captures, haystack: &str, index: usize) -> Option<u64> {
    let span = caps.get_group(index)?;
    haystack[span.range()].parse().ok()
}

/// Output file contents for a sorted list of hits
pub fn render(hits: &[TileHit]) -> String {
    if hits.is_empty() {
        return NO_MATCHES_SENTINEL.to_string();
    }

    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for hit in hits {
        out.push_str(&hit.to_csv_row());
        out.push('\n');
    }
    out
}

/// Scan `log_path` and write the result to `output`. Returns the number of
/// oversized tiles found.
///
/// The log is decoded lossily, so stray invalid UTF-8 never aborts a scan.
pub fn run(log_path: &Path, output: &Path) -> Result<usize, BatchError> {
    let bytes = fs::read(log_path).map_err(|source| BatchError::Read {
        path: log_path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);

    let hits = TileLogScanner::new()?.scan(&text);
    write_atomic(output, &render(&hits))?;
    Ok(hits.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scanner() -> TileLogScanner {
        TileLogScanner::new().unwrap()
    }

    #[test]
    fn test_matches_warning_anywhere_in_line() {
        let hit = scanner()
            .scan_line("  [warn] tile 2/2/1 has 1535647 features, >1400000   ")
            .unwrap();
        assert_eq!((hit.z, hit.x, hit.y), (2, 2, 1));
        assert_eq!(hit.features, 1_535_647);
        assert_eq!(hit.limit, 1_400_000);
        assert_eq!(hit.line, "[warn] tile 2/2/1 has 1535647 features, >1400000");
    }

    #[test]
    fn test_case_insensitive_and_flexible_spacing() {
        assert!(scanner()
            .scan_line("TILE 5/10/12   HAS 9 FEATURES,> 8")
            .is_some());
        assert!(scanner().scan_line("tile 5/10 has 9 features, >8").is_none());
        assert!(scanner().scan_line("nothing to see").is_none());
    }

    #[test]
    fn test_sorted_numerically() {
        let log = "tile 10/1/1 has 5 features, >4\n\
                   tile 2/3/1 has 5 features, >4\n\
                   tile 2/2/9 has 7 features, >4\n";
        let hits = scanner().scan(log);
        let keys: Vec<_> = hits.iter().map(|h| (h.z, h.x, h.y)).collect();
        assert_eq!(keys, vec![(2, 2, 9), (2, 3, 1), (10, 1, 1)]);
    }

    #[test]
    fn test_carriage_returns_split_lines() {
        let log = "  99.9%  2/1/1  \rtile 2/2/1 has 5 features, >4\rtile 3/1/1 has 6 features, >4\r\n";
        let hits = scanner().scan(log);
        let lines: Vec<_> = hits.iter().map(|h| h.line.as_str()).collect();
        assert_eq!(
            lines,
            vec![
                "tile 2/2/1 has 5 features, >4",
                "tile 3/1/1 has 6 features, >4"
            ]
        );
        assert!(!render(&hits).contains('\r'));
    }

    #[test]
    fn test_render_escapes_commas() {
        let hits = scanner().scan("tile 2/2/1 has 1535647 features, >1400000\n");
        assert_eq!(
            render(&hits),
            "z,x,y,features,limit,log_line\n\
             2,2,1,1535647,1400000,tile 2/2/1 has 1535647 features\\, >1400000\n"
        );
    }

    #[test]
    fn test_render_empty_is_sentinel() {
        assert_eq!(render(&[]), "# no tiles over threshold\n");
    }

    #[test]
    fn test_run_writes_output() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("joblog.txt");
        fs::write(&log, b"ok\ntile 3/1/2 has 20 features, >10\n\xff\xfe garbage\n").unwrap();
        let out = dir.path().join("data/over.txt");

        assert_eq!(run(&log, &out).unwrap(), 1);
        let written = fs::read_to_string(&out).unwrap();
        assert!(written.starts_with("z,x,y,features,limit,log_line\n3,1,2,20,10,"));
    }

    #[test]
    fn test_run_without_matches_writes_sentinel() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("joblog.txt");
        fs::write(&log, "all good\n").unwrap();
        let out = dir.path().join("over.txt");

        assert_eq!(run(&log, &out).unwrap(), 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), NO_MATCHES_SENTINEL);
    }

    #[test]
    fn test_unreadable_log_leaves_output_alone() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("over.txt");
        fs::write(&out, "previous").unwrap();

        let err = run(&dir.path().join("missing.txt"), &out).unwrap_err();
        assert!(matches!(err, BatchError::Read { .. }));
        assert_eq!(fs::read_to_string(&out).unwrap(), "previous");
    }
}
