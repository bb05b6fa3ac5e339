//! Media folder scanner.
//!
//! Walks every configured section root recursively and collects the files
//! with a known media extension into a [`Catalog`]. Missing or invalid
//! directories are logged and skipped; the scanner itself never fails.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::entry::{Catalog, CatalogEntry};
use crate::mime::kind_for_path;

/// Scans the configured section roots and builds the media catalog.
///
/// `folders` maps section names to directory paths; sections are visited in
/// map order so two scans of an unchanged tree assign identical ids.
pub fn scan_media_folders(folders: &BTreeMap<String, PathBuf>) -> Catalog {
    let mut entries = Vec::new();

    for (section, root) in folders {
        if !root.is_dir() {
            warn!(
                section = section.as_str(),
                path = %root.display(),
                "media folder is not a valid directory, skipping"
            );
            continue;
        }

        info!(section = section.as_str(), path = %root.display(), "scanning media folder");
        scan_dir(section, root, root, &mut entries);
    }

    info!(files = entries.len(), "media scan complete");
    Catalog::new(entries)
}

fn scan_dir(section: &str, root: &Path, dir: &Path, entries: &mut Vec<CatalogEntry>) {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(err) => {
            warn!(path = %dir.display(), error = %err, "cannot read directory, skipping");
            return;
        }
    };

    // Sort by name so ids are stable across scans of an unchanged tree.
    let mut paths: Vec<PathBuf> = read
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            scan_dir(section, root, &path, entries);
            continue;
        }
        if !path.is_file() {
            continue;
        }

        let Some(kind) = kind_for_path(&path) else {
            debug!(path = %path.display(), "unknown extension, skipping");
            continue;
        };

        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "non UTF-8 file name, skipping");
            continue;
        };

        let rel_path = path
            .parent()
            .and_then(|p| p.strip_prefix(root).ok())
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(path = %path.display(), ?kind, "adding file");
        entries.push(CatalogEntry {
            id: entries.len() as u32,
            section: section.to_string(),
            filename: filename.to_string(),
            rel_path,
            kind,
            path,
        });
    }
}
