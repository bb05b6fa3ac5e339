//! JSON RPC facade over the catalog and the orchestrator.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use cmcatalog::{Catalog, GameCatalog};
use cmcontrol::{PlayResult, PlaybackOrchestrator, ReceiverDescriptor};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::media::serve_media;
use crate::records::{to_records, CatalogRecord};

/// Shared, read-mostly state behind every route. Catalogs are immutable;
/// the orchestrator guards its own session state.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub games: Arc<GameCatalog>,
    pub orchestrator: Arc<PlaybackOrchestrator>,
}

/// One receiver of a play request, as supplied on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiverDto {
    pub name: String,
    #[serde(default)]
    pub ipv4: String,
    #[serde(default)]
    pub ipv6: String,
}

impl From<ReceiverDto> for ReceiverDescriptor {
    fn from(dto: ReceiverDto) -> Self {
        ReceiverDescriptor {
            name: dto.name,
            ipv4: dto.ipv4,
            ipv6: dto.ipv6,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub file_id: u32,
    pub receivers: Vec<ReceiverDto>,
}

#[derive(Debug, Serialize)]
pub struct PlayReply {
    /// Numeric result code (see [`PlayResult::as_u8`]).
    pub result: u8,
    pub code: &'static str,
}

impl From<PlayResult> for PlayReply {
    fn from(result: PlayResult) -> Self {
        Self {
            result: result.as_u8(),
            code: result.label(),
        }
    }
}

/// Builds the RPC router: file list, game list, playback, media delivery.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/files", get(get_file_list))
        .route("/api/games", get(get_game_list))
        .route("/api/play", post(play_media))
        .route("/media", get(serve_media))
        .with_state(state)
}

/// `getFileList`: the ordered media catalog.
pub async fn get_file_list(State(state): State<AppState>) -> Json<Vec<CatalogRecord>> {
    Json(to_records(state.catalog.iter()))
}

/// `getGameList`: the ordered game catalog, same wire shape.
pub async fn get_game_list(State(state): State<AppState>) -> Json<Vec<CatalogRecord>> {
    Json(to_records(state.games.iter()))
}

/// `playMedia`: resolves the request on a blocking worker since the casting
/// client's connect/cast calls are synchronous.
pub async fn play_media(
    State(state): State<AppState>,
    Json(request): Json<PlayRequest>,
) -> Json<PlayReply> {
    let receivers: Vec<ReceiverDescriptor> =
        request.receivers.into_iter().map(Into::into).collect();
    let file_id = request.file_id;

    let result = tokio::task::spawn_blocking(move || {
        state
            .orchestrator
            .request_playback(&state.catalog, file_id, &receivers)
    })
    .await
    .unwrap_or_else(|err| {
        error!(error = %err, "playback worker panicked");
        PlayResult::ConnectFailed
    });

    Json(result.into())
}
