//! Maps file extensions to mime types and media kinds.
//!
//! Only files with a known extension make it into the catalog; everything
//! else is skipped by the scanner. Playlists (`m3u`/`m3u8`) are classified
//! separately from their `audio/x-mpegurl` mime type.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::entry::MediaKind;

static MIMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("3g2", "video/3gpp2"),
        ("3gp", "video/3gpp"),
        ("3gpp", "video/3gpp"),
        ("aac", "audio/aac"),
        ("adp", "audio/adpcm"),
        ("apng", "image/apng"),
        ("au", "audio/basic"),
        ("bmp", "image/bmp"),
        ("flac", "audio/flac"),
        ("gif", "image/gif"),
        ("h261", "video/h261"),
        ("h263", "video/h263"),
        ("h264", "video/h264"),
        ("heic", "image/heic"),
        ("heif", "image/heif"),
        ("jp2", "image/jp2"),
        ("jpe", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("jpg", "image/jpeg"),
        ("kar", "audio/midi"),
        ("m1v", "video/mpeg"),
        ("m2a", "audio/mpeg"),
        ("m2v", "video/mpeg"),
        ("m3u", "audio/x-mpegurl"),
        ("m3u8", "audio/x-mpegurl"),
        ("m4a", "audio/mp4"),
        ("mid", "audio/midi"),
        ("midi", "audio/midi"),
        ("mkv", "video/x-matroska"),
        ("mov", "video/quicktime"),
        ("mp2", "audio/mpeg"),
        ("mp3", "audio/mpeg"),
        ("mp4", "video/mp4"),
        ("mp4a", "audio/mp4"),
        ("mp4v", "video/mp4"),
        ("mpe", "video/mpeg"),
        ("mpeg", "video/mpeg"),
        ("mpg", "video/mpeg"),
        ("mpg4", "video/mp4"),
        ("mpga", "audio/mpeg"),
        ("oga", "audio/ogg"),
        ("ogg", "audio/ogg"),
        ("ogv", "video/ogg"),
        ("png", "image/png"),
        ("qt", "video/quicktime"),
        ("snd", "audio/basic"),
        ("spx", "audio/ogg"),
        ("svg", "image/svg+xml"),
        ("tif", "image/tiff"),
        ("tiff", "image/tiff"),
        ("ts", "video/mp2t"),
        ("wav", "audio/wav"),
        ("weba", "audio/webm"),
        ("webm", "video/webm"),
        ("webp", "image/webp"),
    ])
});

/// Mime type for a bare extension (no leading dot, case-insensitive).
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    MIMES.get(extension.to_ascii_lowercase().as_str()).copied()
}

/// Media kind for a bare extension, `None` for unknown extensions.
pub fn kind_for_extension(extension: &str) -> Option<MediaKind> {
    let ext = extension.to_ascii_lowercase();
    if ext == "m3u" || ext == "m3u8" {
        return Some(MediaKind::Playlist);
    }

    let mime = mime_for_extension(&ext)?;
    if mime.starts_with("audio/") {
        Some(MediaKind::Audio)
    } else if mime.starts_with("video/") {
        Some(MediaKind::Video)
    } else if mime.starts_with("image/") {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// Mime type derived from a path's extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    mime_for_extension(path.extension()?.to_str()?)
}

/// Media kind derived from a path's extension.
pub fn kind_for_path(path: &Path) -> Option<MediaKind> {
    kind_for_extension(path.extension()?.to_str()?)
}
