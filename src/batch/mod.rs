//! Offline jobs that accompany the server
//!
//! - [`tile_log`]: extract tile-overflow warnings from a tiling build log
//! - [`manifest`]: generate the `DOWNLOADABLE.md` listing of served files
//!
//! Both write their artifact through [`write_atomic`], so an interrupted run
//! leaves the previous artifact untouched.

pub mod manifest;
pub mod tile_log;

use crate::error::BatchError;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `contents` to `path` via a temporary sibling and a rename.
///
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), BatchError> {
    let write_err = |source| BatchError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp = temp_sibling(path);
    if let Err(e) = fs::write(&tmp, contents) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        write_err(e)
    })
}

/// `dir/.name.tmp-<pid>` next to the final file, so the rename stays on one filesystem
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "output".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp-{}", std::process::id()))
}
