//! # cmcatalog - Media catalog for CMCast
//!
//! This crate owns everything the server knows about local media before a
//! single byte is cast: the immutable [`Catalog`] built at startup, the
//! extension based mime/kind classification, and the two scanners that
//! populate the catalogs (media folders and game systems).
//!
//! The catalog is built once and never mutated afterwards; every other crate
//! only holds shared read access to it. Directory-change notification is an
//! extension point that is intentionally not implemented yet.

pub mod entry;
pub mod games;
pub mod mime;
pub mod scan;

pub use entry::{Catalog, CatalogEntry, MediaKind};
pub use games::{Game, GameCatalog, GameEntry, GameSystem, Save, scan_game_systems};
pub use mime::{kind_for_extension, kind_for_path, mime_for_extension, mime_for_path};
pub use scan::scan_media_folders;
