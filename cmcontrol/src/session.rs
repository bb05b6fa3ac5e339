//! Per-receiver playback sessions and the store guarding them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::client::ReceiverHandle;

/// Playback progress for one receiver connection.
///
/// Created when a play request establishes its connection, mutated only by
/// the status event handler afterwards, destroyed on playlist exhaustion or
/// a user-initiated stop.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSession {
    /// Becomes true once the synthetic post-connect status callback has been
    /// absorbed.
    pub initialized: bool,
    pub has_playlist: bool,
    /// Ordered absolute paths; only meaningful when `has_playlist` is set.
    pub playlist: Vec<PathBuf>,
    /// Next playlist index to cast. Invariant: `position <= playlist.len()`.
    pub position: u32,
}

/// Concurrency-safe store for sessions and activity flags.
///
/// The two maps are locked independently. All mutations to a given handle's
/// session go through the session-map lock, which totally orders them; the
/// activity map only carries the "is actively playing" flag. Operations that
/// need both maps must take the session lock first (see [`SessionStore::remove`])
/// so no inverted acquisition order can deadlock.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ReceiverHandle, PlaybackSession>>,
    activity: Mutex<HashMap<ReceiverHandle, bool>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly defaulted session for the handle, replacing any
    /// previous one. Used when a play request (re)claims a connection.
    pub fn reset(&self, handle: ReceiverHandle) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(handle, PlaybackSession::default());
    }

    /// Snapshot of a session, no mutation. `None` for unknown handles.
    pub fn get(&self, handle: ReceiverHandle) -> Option<PlaybackSession> {
        let sessions = self.sessions.lock().unwrap();
        sessions.get(&handle).cloned()
    }

    /// Applies `f` to the handle's session under the session-map lock.
    /// Returns `None` when no session exists for the handle.
    pub fn update<R>(
        &self,
        handle: ReceiverHandle,
        f: impl FnOnce(&mut PlaybackSession) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.get_mut(&handle).map(f)
    }

    /// Applies `f` to the handle's session, inserting a default one first if
    /// none exists.
    pub fn update_or_create<R>(
        &self,
        handle: ReceiverHandle,
        f: impl FnOnce(&mut PlaybackSession) -> R,
    ) -> R {
        let mut sessions = self.sessions.lock().unwrap();
        f(sessions.entry(handle).or_default())
    }

    /// Marks a receiver as actively playing or not. Idempotent. A handle
    /// without a live session is ignored, so the activity flag cannot
    /// outlive its session (late poller pushes after teardown would
    /// otherwise leave orphaned entries).
    ///
    /// Lock order: session map first, then activity map.
    pub fn set_active(&self, handle: ReceiverHandle, active: bool) {
        let sessions = self.sessions.lock().unwrap();
        if !sessions.contains_key(&handle) {
            return;
        }
        let mut activity = self.activity.lock().unwrap();
        activity.insert(handle, active);
    }

    pub fn is_active(&self, handle: ReceiverHandle) -> bool {
        let activity = self.activity.lock().unwrap();
        activity.get(&handle).copied().unwrap_or(false)
    }

    /// Removes the session and activity entries for a handle. Idempotent
    /// against already-missing entries.
    ///
    /// Lock order: session map first, then activity map.
    pub fn remove(&self, handle: ReceiverHandle) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(&handle);
        let mut activity = self.activity.lock().unwrap();
        activity.remove(&handle);
    }

    pub fn contains(&self, handle: ReceiverHandle) -> bool {
        let sessions = self.sessions.lock().unwrap();
        sessions.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        let sessions = self.sessions.lock().unwrap();
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
