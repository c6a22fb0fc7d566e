//! Source directory scanner.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use notesite_shared::{NotesiteError, Result};

use crate::classifier::has_source_extension;

/// Prefix of the lock files Word keeps next to open documents.
const LOCK_FILE_PREFIX: &str = "~$";

/// List the `.docx` files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. Word lock files are skipped.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn scan_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| NotesiteError::io(dir, e))?;
    let mut sources = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| NotesiteError::io(dir, e))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            debug!(path = %path.display(), "skipping non-UTF-8 file name");
            continue;
        };

        if !has_source_extension(name) {
            continue;
        }
        if name.starts_with(LOCK_FILE_PREFIX) {
            debug!(name, "skipping lock file");
            continue;
        }

        sources.push(path);
    }

    sources.sort();
    debug!(count = sources.len(), "scan complete");
    Ok(sources)
}
