//! # cmplaylist - Playlist expansion for CMCast
//!
//! Expands an `m3u`-style playlist file into the ordered list of existing
//! media files it references. Expansion is pure: the same file contents
//! always yield the same output.

mod expand;

pub use expand::{expand_playlist, PlaylistError};
