//! Asynchronous status events and their single-consumer worker.
//!
//! The casting client pushes one [`StatusEvent`] per observed transition on
//! the channel; a dedicated worker thread consumes them and drives the
//! orchestrator's state machine. Keeping a single consumer preserves the
//! per-handle ordering the session store relies on.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use crate::client::ReceiverHandle;
use crate::orchestrator::PlaybackOrchestrator;

/// Receiver playback status as reported by the casting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverStatus {
    Playing,
    Stopped,
}

/// One asynchronous status notification.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub handle: ReceiverHandle,
    pub status: ReceiverStatus,
    /// True when the stop was initiated by the user at the receiver side,
    /// which bypasses playlist continuation.
    pub stopped_by_user: bool,
}

/// Creates the status event channel shared by the casting client (producer)
/// and the status worker (consumer).
pub fn status_channel() -> (Sender<StatusEvent>, Receiver<StatusEvent>) {
    unbounded()
}

/// Spawns the single consumer thread feeding status events into the
/// orchestrator. The thread exits when every sender has been dropped.
pub fn spawn_status_worker(
    orchestrator: Arc<PlaybackOrchestrator>,
    events: Receiver<StatusEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in events.iter() {
            orchestrator.handle_status(&event);
        }
        debug!("status channel closed, worker exiting");
    })
}
