use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PlaylistError {
    #[error("cannot read playlist {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Expands a playlist file into the ordered list of media paths it names.
///
/// The file is read line by line. Lines starting with `#` and blank lines
/// are skipped; every other line is taken as a filesystem path and kept only
/// if it names an existing regular file. Dropped lines are logged, never
/// fatal. An empty result is valid; callers decide whether to treat it as a
/// failure.
pub fn expand_playlist(path: &Path) -> Result<Vec<PathBuf>, PlaylistError> {
    let contents = fs::read_to_string(path).map_err(|source| PlaylistError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut items = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let item = PathBuf::from(line);
        if item.is_file() {
            items.push(item);
        } else {
            warn!(
                playlist = %path.display(),
                entry = line,
                "playlist entry does not name an existing file, dropping"
            );
        }
    }

    debug!(playlist = %path.display(), entries = items.len(), "playlist expanded");
    Ok(items)
}
