//! Catalog data model.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Coarse media classification, derived from the file extension.
///
/// The numeric values are part of the wire format returned by the file-list
/// RPC and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
    Image,
    Playlist,
}

impl MediaKind {
    /// Wire representation: 0=Audio, 1=Video, 2=Image, 3=Playlist.
    pub fn as_u8(self) -> u8 {
        match self {
            MediaKind::Audio => 0,
            MediaKind::Video => 1,
            MediaKind::Image => 2,
            MediaKind::Playlist => 3,
        }
    }
}

/// One entry of the media catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Stable identifier within a scan; doubles as the index into the catalog.
    pub id: u32,
    /// Name of the configured source group the file was found under.
    pub section: String,
    /// File name without directory components.
    pub filename: String,
    /// Directory part of the path, relative to the section root.
    pub rel_path: String,
    pub kind: MediaKind,
    /// Absolute path on disk.
    pub path: PathBuf,
}

/// Immutable, ordered list of media entries, indexable by id.
///
/// Built once at startup by [`crate::scan::scan_media_folders`]; read-only to
/// every other component.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Wraps a scan result. Entry ids are expected to match their index.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        debug_assert!(entries.iter().enumerate().all(|(i, e)| e.id as usize == i));
        Self { entries }
    }

    /// Looks an entry up by id. `None` when the id is outside the scan range.
    pub fn get(&self, id: u32) -> Option<&CatalogEntry> {
        self.entries.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32) -> CatalogEntry {
        CatalogEntry {
            id,
            section: "music".to_string(),
            filename: format!("track{id}.mp3"),
            rel_path: String::new(),
            kind: MediaKind::Audio,
            path: PathBuf::from(format!("/music/track{id}.mp3")),
        }
    }

    #[test]
    fn lookup_by_id_matches_scan_order() {
        let catalog = Catalog::new(vec![entry(0), entry(1), entry(2)]);

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(1).map(|e| e.filename.as_str()), Some("track1.mp3"));
        assert!(catalog.get(3).is_none());
        assert!(catalog.get(u32::MAX).is_none());
    }

    #[test]
    fn kind_wire_codes_are_stable() {
        assert_eq!(MediaKind::Audio.as_u8(), 0);
        assert_eq!(MediaKind::Video.as_u8(), 1);
        assert_eq!(MediaKind::Image.as_u8(), 2);
        assert_eq!(MediaKind::Playlist.as_u8(), 3);
    }
}
