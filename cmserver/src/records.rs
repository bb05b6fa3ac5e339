//! Catalog serialization shared by the file-list and game-list RPCs.
//!
//! The media catalog and the game catalog stay separate types; they only
//! share this one wire shape, produced by a single routine parameterized by
//! the record source.

use cmcatalog::{CatalogEntry, GameEntry};
use serde::Serialize;

/// Wire record for one catalog entry of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRecord {
    pub id: u32,
    pub section: String,
    pub filename: String,
    pub rel_path: String,
    /// 0=Audio, 1=Video, 2=Image, 3=Playlist; always 0 for game entries.
    pub kind: u8,
}

/// Anything serializable as a catalog record.
pub trait RecordSource {
    fn record(&self) -> CatalogRecord;
}

impl RecordSource for CatalogEntry {
    fn record(&self) -> CatalogRecord {
        CatalogRecord {
            id: self.id,
            section: self.section.clone(),
            filename: self.filename.clone(),
            rel_path: self.rel_path.clone(),
            kind: self.kind.as_u8(),
        }
    }
}

impl RecordSource for GameEntry {
    fn record(&self) -> CatalogRecord {
        CatalogRecord {
            id: self.id,
            section: self.system.clone(),
            filename: self.name.clone(),
            rel_path: self.rel_path.clone(),
            kind: 0,
        }
    }
}

/// Serializes an ordered sequence of entries into wire records.
pub fn to_records<'a, T, I>(items: I) -> Vec<CatalogRecord>
where
    T: RecordSource + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(RecordSource::record).collect()
}
