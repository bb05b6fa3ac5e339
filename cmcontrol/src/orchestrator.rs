//! Playback orchestration: play-request resolution and the per-handle status
//! state machine.

use std::path::PathBuf;
use std::sync::Arc;

use cmcatalog::{Catalog, MediaKind};
use cmplaylist::expand_playlist;
use tracing::{debug, error, info, warn};

use crate::client::{CastClient, ReceiverHandle};
use crate::receiver::ReceiverDescriptor;
use crate::session::SessionStore;
use crate::status::{ReceiverStatus, StatusEvent};

/// Synchronous outcome of a play request, as returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayResult {
    Success,
    InvalidFile,
    NoReceivers,
    ConnectFailed,
    PlaylistEmpty,
}

impl PlayResult {
    /// Wire representation of the result code.
    pub fn as_u8(self) -> u8 {
        match self {
            PlayResult::Success => 0,
            PlayResult::InvalidFile => 1,
            PlayResult::NoReceivers => 2,
            PlayResult::ConnectFailed => 3,
            PlayResult::PlaylistEmpty => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayResult::Success => "Success",
            PlayResult::InvalidFile => "InvalidFile",
            PlayResult::NoReceivers => "NoReceivers",
            PlayResult::ConnectFailed => "ConnectFailed",
            PlayResult::PlaylistEmpty => "PlaylistEmpty",
        }
    }
}

/// What the status state machine decided to do after inspecting a session.
enum Continuation {
    Ignore,
    Teardown,
    CastNext(PathBuf),
}

/// Resolves play requests against the catalog and owns the session store.
///
/// One instance lives for the whole process; the RPC facade and the status
/// worker share it behind an `Arc`.
pub struct PlaybackOrchestrator {
    client: Arc<dyn CastClient>,
    sessions: SessionStore,
}

impl PlaybackOrchestrator {
    pub fn new(client: Arc<dyn CastClient>) -> Self {
        Self {
            client,
            sessions: SessionStore::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Resolves a play request and starts playback on the primary receiver.
    ///
    /// Returns as soon as the first cast call completes; playback progress is
    /// driven afterwards by status events. Slave registration failures are
    /// logged but never fail the request.
    pub fn request_playback(
        &self,
        catalog: &Catalog,
        file_id: u32,
        receivers: &[ReceiverDescriptor],
    ) -> PlayResult {
        if receivers.is_empty() {
            warn!(file_id, "play request without receivers");
            return PlayResult::NoReceivers;
        }
        let Some(entry) = catalog.get(file_id) else {
            warn!(file_id, "play request for unknown file id");
            return PlayResult::InvalidFile;
        };

        let primary = &receivers[0];
        let handle = match self.client.connect(primary) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(
                    receiver = primary.name.as_str(),
                    error = %err,
                    "cannot connect to primary receiver"
                );
                return PlayResult::ConnectFailed;
            }
        };

        if receivers.len() > 1 {
            // Best effort: the primary keeps playing even without its slaves.
            if let Err(err) = self.client.add_slaves(handle, &receivers[1..]) {
                warn!(%handle, error = %err, "slave registration failed, continuing with primary only");
            }
        }

        // Claim the handle before playback starts so a concurrent request on
        // the same handle cannot race the session setup.
        self.sessions.reset(handle);

        info!(
            file_id,
            %handle,
            receiver = primary.name.as_str(),
            file = entry.filename.as_str(),
            "starting playback"
        );

        let first = match entry.kind {
            MediaKind::Playlist => {
                let items = match expand_playlist(&entry.path) {
                    Ok(items) => items,
                    Err(err) => {
                        warn!(playlist = %entry.path.display(), error = %err, "playlist expansion failed");
                        Vec::new()
                    }
                };
                if items.is_empty() {
                    self.teardown(handle);
                    return PlayResult::PlaylistEmpty;
                }
                let first = items[0].clone();
                self.sessions.update(handle, |session| {
                    session.has_playlist = true;
                    session.playlist = items;
                    session.position = 1;
                });
                first
            }
            _ => entry.path.clone(),
        };

        if let Err(err) = self.client.cast(handle, &first) {
            error!(%handle, media = %first.display(), error = %err, "initial cast failed");
            self.teardown(handle);
            return PlayResult::ConnectFailed;
        }

        PlayResult::Success
    }

    /// Drives the per-handle state machine from one status notification.
    ///
    /// The first Stopped event after a connect is synthetic and is absorbed
    /// by flipping `initialized`; later natural stops either advance the
    /// playlist or tear the session down. A user-initiated stop always tears
    /// down immediately.
    pub fn handle_status(&self, event: &StatusEvent) {
        match event.status {
            ReceiverStatus::Playing => {
                self.sessions.set_active(event.handle, true);
                return;
            }
            ReceiverStatus::Stopped => {}
        }

        if event.stopped_by_user {
            info!(handle = %event.handle, "user stopped playback, tearing session down");
            self.teardown(event.handle);
            return;
        }

        let continuation = self.sessions.update(event.handle, |session| {
            if !session.initialized {
                session.initialized = true;
                return Continuation::Ignore;
            }
            if !session.has_playlist {
                return Continuation::Teardown;
            }
            match session.playlist.get(session.position as usize) {
                Some(item) => {
                    let item = item.clone();
                    session.position += 1;
                    Continuation::CastNext(item)
                }
                None => Continuation::Teardown,
            }
        });

        match continuation {
            None => {
                // Already cleaned up; a late event for a dead handle.
                debug!(handle = %event.handle, "status event for unknown handle, ignoring");
            }
            Some(Continuation::Ignore) => {
                debug!(handle = %event.handle, "absorbed post-connect status callback");
            }
            Some(Continuation::Teardown) => {
                info!(handle = %event.handle, "playback finished, tearing session down");
                self.teardown(event.handle);
            }
            Some(Continuation::CastNext(item)) => {
                debug!(handle = %event.handle, media = %item.display(), "advancing playlist");
                if let Err(err) = self.client.cast(event.handle, &item) {
                    // No caller to report to; the session stays in place with
                    // a stale position.
                    error!(
                        handle = %event.handle,
                        media = %item.display(),
                        error = %err,
                        "failed to cast next playlist entry"
                    );
                }
            }
        }
    }

    /// Removes all session state for a handle, then disconnects the receiver.
    fn teardown(&self, handle: ReceiverHandle) {
        self.sessions.remove(handle);
        if let Err(err) = self.client.disconnect(handle) {
            warn!(%handle, error = %err, "disconnect failed during teardown");
        }
    }
}
