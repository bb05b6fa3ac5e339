//! Media delivery route consumed by receivers.
//!
//! Receivers fetch the bytes of whatever the orchestrator casts as plain
//! HTTP; the cast URL carries the absolute path picked by the orchestrator,
//! so the route is keyed by path rather than catalog id (playlist entries
//! may name files outside the catalog).

use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub path: String,
}

/// Streams one media file to a receiver.
pub async fn serve_media(Query(query): Query<MediaQuery>) -> Result<Response, StatusCode> {
    let path = std::path::PathBuf::from(&query.path);
    if !path.is_absolute() {
        warn!(path = query.path.as_str(), "rejecting non-absolute media path");
        return Err(StatusCode::BAD_REQUEST);
    }

    let file = tokio::fs::File::open(&path).await.map_err(|err| {
        warn!(path = %path.display(), error = %err, "media file not readable");
        StatusCode::NOT_FOUND
    })?;

    let mime = cmcatalog::mime_for_path(&path).unwrap_or("application/octet-stream");
    debug!(path = %path.display(), mime, "serving media");

    let stream = ReaderStream::new(file);
    let response = ([(header::CONTENT_TYPE, mime)], Body::from_stream(stream)).into_response();
    Ok(response)
}
