//! Scratch directory helpers for extracted assets.
//!
//! Extracted clips are named `{uuid}_{entry}` so concurrent extractions of
//! the same object never collide. The engine sweeps the directory after
//! every item, keeping only files still in use.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use uuid::Uuid;

use crate::error::Result;

/// Collision-free path for an extracted entry inside `dir`
pub fn unique_path(dir: &Path, entry_name: &str) -> PathBuf {
    let file_name = Path::new(entry_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string());
    dir.join(format!("{}_{}", Uuid::new_v4().simple(), file_name))
}

/// Remove every file in `dir` except those listed in `keep`.
///
/// Files that can't be removed (still open elsewhere) are logged and left for
/// the next sweep. Returns the number of files removed.
pub fn clean(dir: &Path, keep: &[PathBuf]) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || keep.iter().any(|k| k == &path) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not delete {}: {}", path.display(), e),
        }
    }

    if removed > 0 {
        debug!("Removed {} scratch file(s) from {}", removed, dir.display());
    }
    Ok(removed)
}
