//! End-to-end tests of the orchestrator state machine against a recording
//! mock casting client.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use cmcatalog::{Catalog, CatalogEntry, MediaKind};
use cmcontrol::{
    spawn_status_worker, status_channel, CastClient, CastError, PlayResult, PlaybackOrchestrator,
    ReceiverDescriptor, ReceiverHandle, ReceiverStatus, StatusEvent,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Connect(String),
    AddSlaves(u32, Vec<String>),
    Cast(u32, PathBuf),
    Disconnect(u32),
}

#[derive(Default)]
struct MockClient {
    calls: Mutex<Vec<Call>>,
    next_handle: AtomicU32,
    fail_connect: AtomicBool,
    fail_slaves: AtomicBool,
    fail_casts_after: Mutex<Option<usize>>,
}

impl MockClient {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            next_handle: AtomicU32::new(1),
            ..Self::default()
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn casts(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Cast(_, path) => Some(path),
                _ => None,
            })
            .collect()
    }

    fn disconnects(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Disconnect(_)))
            .count()
    }

    fn cast_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Cast(..)))
            .count()
    }
}

impl CastClient for MockClient {
    fn connect(&self, receiver: &ReceiverDescriptor) -> Result<ReceiverHandle, CastError> {
        if self.fail_connect.load(Ordering::Relaxed) {
            return Err(CastError::Unreachable(receiver.name.clone()));
        }
        let handle = ReceiverHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.calls
            .lock()
            .unwrap()
            .push(Call::Connect(receiver.name.clone()));
        Ok(handle)
    }

    fn add_slaves(
        &self,
        handle: ReceiverHandle,
        slaves: &[ReceiverDescriptor],
    ) -> Result<(), CastError> {
        if self.fail_slaves.load(Ordering::Relaxed) {
            return Err(CastError::Backend("slaves unreachable".to_string()));
        }
        self.calls.lock().unwrap().push(Call::AddSlaves(
            handle.0,
            slaves.iter().map(|s| s.name.clone()).collect(),
        ));
        Ok(())
    }

    fn cast(&self, handle: ReceiverHandle, media: &Path) -> Result<(), CastError> {
        let mut calls = self.calls.lock().unwrap();
        let so_far = calls.iter().filter(|c| matches!(c, Call::Cast(..))).count();
        if let Some(limit) = *self.fail_casts_after.lock().unwrap() {
            if so_far >= limit {
                return Err(CastError::Backend("cast refused".to_string()));
            }
        }
        calls.push(Call::Cast(handle.0, media.to_path_buf()));
        Ok(())
    }

    fn disconnect(&self, handle: ReceiverHandle) -> Result<(), CastError> {
        self.calls.lock().unwrap().push(Call::Disconnect(handle.0));
        Ok(())
    }
}

fn receiver(name: &str) -> ReceiverDescriptor {
    ReceiverDescriptor {
        name: name.to_string(),
        ipv4: "192.168.1.50".to_string(),
        ipv6: String::new(),
    }
}

fn media_entry(id: u32, path: &Path) -> CatalogEntry {
    CatalogEntry {
        id,
        section: "music".to_string(),
        filename: path.file_name().unwrap().to_str().unwrap().to_string(),
        rel_path: String::new(),
        kind: MediaKind::Audio,
        path: path.to_path_buf(),
    }
}

fn playlist_entry(id: u32, path: &Path) -> CatalogEntry {
    CatalogEntry {
        id,
        section: "music".to_string(),
        filename: path.file_name().unwrap().to_str().unwrap().to_string(),
        rel_path: String::new(),
        kind: MediaKind::Playlist,
        path: path.to_path_buf(),
    }
}

fn touch(path: &Path) {
    File::create(path).unwrap();
}

fn stopped(handle: ReceiverHandle) -> StatusEvent {
    StatusEvent {
        handle,
        status: ReceiverStatus::Stopped,
        stopped_by_user: false,
    }
}

fn user_stopped(handle: ReceiverHandle) -> StatusEvent {
    StatusEvent {
        handle,
        status: ReceiverStatus::Stopped,
        stopped_by_user: true,
    }
}

fn playing(handle: ReceiverHandle) -> StatusEvent {
    StatusEvent {
        handle,
        status: ReceiverStatus::Playing,
        stopped_by_user: false,
    }
}

#[test]
fn invalid_file_id_makes_no_connection_attempt() {
    let client = MockClient::new();
    let orchestrator = PlaybackOrchestrator::new(client.clone());
    let catalog = Catalog::new(vec![]);

    let result = orchestrator.request_playback(&catalog, 42, &[receiver("living-room")]);

    assert_eq!(result, PlayResult::InvalidFile);
    assert!(client.calls().is_empty());
}

#[test]
fn empty_receiver_list_makes_no_connection_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("a.mp3");
    touch(&track);

    let client = MockClient::new();
    let orchestrator = PlaybackOrchestrator::new(client.clone());
    let catalog = Catalog::new(vec![media_entry(0, &track)]);

    let result = orchestrator.request_playback(&catalog, 0, &[]);

    assert_eq!(result, PlayResult::NoReceivers);
    assert!(client.calls().is_empty());
}

#[test]
fn connect_failure_is_surfaced_synchronously() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("a.mp3");
    touch(&track);

    let client = MockClient::new();
    client.fail_connect.store(true, Ordering::Relaxed);
    let orchestrator = PlaybackOrchestrator::new(client.clone());
    let catalog = Catalog::new(vec![media_entry(0, &track)]);

    let result = orchestrator.request_playback(&catalog, 0, &[receiver("living-room")]);

    assert_eq!(result, PlayResult::ConnectFailed);
    assert_eq!(client.cast_count(), 0);
    assert!(orchestrator.sessions().is_empty());
}

#[test]
fn slave_registration_failure_never_fails_the_request() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("a.mp3");
    touch(&track);

    let client = MockClient::new();
    client.fail_slaves.store(true, Ordering::Relaxed);
    let orchestrator = PlaybackOrchestrator::new(client.clone());
    let catalog = Catalog::new(vec![media_entry(0, &track)]);

    let result = orchestrator.request_playback(
        &catalog,
        0,
        &[receiver("living-room"), receiver("kitchen")],
    );

    assert_eq!(result, PlayResult::Success);
    assert_eq!(client.casts(), vec![track]);
}

#[test]
fn single_file_session_absorbs_first_stop_then_tears_down() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("a.mp3");
    touch(&track);

    let client = MockClient::new();
    let orchestrator = PlaybackOrchestrator::new(client.clone());
    let catalog = Catalog::new(vec![media_entry(0, &track)]);

    assert_eq!(
        orchestrator.request_playback(&catalog, 0, &[receiver("living-room")]),
        PlayResult::Success
    );
    let handle = ReceiverHandle(1);

    // Synthetic post-connect callback: absorbed, session stays.
    orchestrator.handle_status(&stopped(handle));
    let session = orchestrator.sessions().get(handle).unwrap();
    assert!(session.initialized);
    assert_eq!(client.disconnects(), 0);

    // Natural end of the single file: teardown + disconnect.
    orchestrator.handle_status(&stopped(handle));
    assert!(orchestrator.sessions().get(handle).is_none());
    assert_eq!(client.disconnects(), 1);
}

#[test]
fn playlist_advances_in_order_and_tears_down_after_the_last_entry() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.mp3");
    let b = dir.path().join("b.mp3");
    touch(&a);
    touch(&b);
    let list = dir.path().join("list.m3u");
    std::fs::write(
        &list,
        format!(
            "#comment\n{}\n{}\n{}\n",
            a.display(),
            dir.path().join("missing.mp3").display(),
            b.display()
        ),
    )
    .unwrap();

    let client = MockClient::new();
    let orchestrator = PlaybackOrchestrator::new(client.clone());
    let catalog = Catalog::new(vec![playlist_entry(0, &list)]);

    assert_eq!(
        orchestrator.request_playback(&catalog, 0, &[receiver("living-room")]),
        PlayResult::Success
    );
    let handle = ReceiverHandle(1);
    assert_eq!(client.casts(), vec![a.clone()]);

    // Absorbed synthetic callback.
    orchestrator.handle_status(&stopped(handle));
    assert_eq!(client.casts(), vec![a.clone()]);

    // First real stop: advance to b.
    orchestrator.handle_status(&stopped(handle));
    assert_eq!(client.casts(), vec![a.clone(), b.clone()]);
    assert!(orchestrator.sessions().contains(handle));

    // Second real stop: playlist exhausted, session gone, receiver dropped.
    orchestrator.handle_status(&stopped(handle));
    assert!(!orchestrator.sessions().contains(handle));
    assert_eq!(client.disconnects(), 1);
    assert_eq!(client.casts(), vec![a, b]);
}

#[test]
fn empty_playlist_is_rejected_and_the_connection_released() {
    let dir = tempfile::tempdir().unwrap();
    let list = dir.path().join("list.m3u");
    std::fs::write(&list, "#nothing here\n/missing/x.mp3\n").unwrap();

    let client = MockClient::new();
    let orchestrator = PlaybackOrchestrator::new(client.clone());
    let catalog = Catalog::new(vec![playlist_entry(0, &list)]);

    let result = orchestrator.request_playback(&catalog, 0, &[receiver("living-room")]);

    assert_eq!(result, PlayResult::PlaylistEmpty);
    assert_eq!(client.cast_count(), 0);
    assert_eq!(client.disconnects(), 1);
    assert!(orchestrator.sessions().is_empty());
}

#[test]
fn user_stop_tears_down_immediately_even_mid_playlist() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.mp3");
    let b = dir.path().join("b.mp3");
    touch(&a);
    touch(&b);
    let list = dir.path().join("list.m3u");
    std::fs::write(&list, format!("{}\n{}\n", a.display(), b.display())).unwrap();

    let client = MockClient::new();
    let orchestrator = PlaybackOrchestrator::new(client.clone());
    let catalog = Catalog::new(vec![playlist_entry(0, &list)]);

    orchestrator.request_playback(&catalog, 0, &[receiver("living-room")]);
    let handle = ReceiverHandle(1);
    orchestrator.handle_status(&stopped(handle));

    // User stop bypasses continuation: b is never cast.
    orchestrator.handle_status(&user_stopped(handle));
    assert!(!orchestrator.sessions().contains(handle));
    assert_eq!(client.disconnects(), 1);
    assert_eq!(client.casts(), vec![a]);
}

#[test]
fn failed_continuation_cast_leaves_the_session_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.mp3");
    let b = dir.path().join("b.mp3");
    touch(&a);
    touch(&b);
    let list = dir.path().join("list.m3u");
    std::fs::write(&list, format!("{}\n{}\n", a.display(), b.display())).unwrap();

    let client = MockClient::new();
    let orchestrator = PlaybackOrchestrator::new(client.clone());
    let catalog = Catalog::new(vec![playlist_entry(0, &list)]);

    orchestrator.request_playback(&catalog, 0, &[receiver("living-room")]);
    let handle = ReceiverHandle(1);
    orchestrator.handle_status(&stopped(handle));

    // All further casts fail.
    *client.fail_casts_after.lock().unwrap() = Some(1);
    orchestrator.handle_status(&stopped(handle));

    // No teardown: the session stays, position already advanced (stale).
    let session = orchestrator.sessions().get(handle).unwrap();
    assert_eq!(session.position, 2);
    assert_eq!(client.disconnects(), 0);
}

#[test]
fn status_for_an_unknown_handle_is_a_no_op() {
    let client = MockClient::new();
    let orchestrator = PlaybackOrchestrator::new(client.clone());

    orchestrator.handle_status(&stopped(ReceiverHandle(99)));

    assert!(client.calls().is_empty());
}

#[test]
fn playing_marks_the_receiver_active() {
    let client = MockClient::new();
    let orchestrator = PlaybackOrchestrator::new(client);
    let handle = ReceiverHandle(5);
    orchestrator.sessions().reset(handle);

    orchestrator.handle_status(&playing(handle));
    assert!(orchestrator.sessions().is_active(handle));

    // Idempotent.
    orchestrator.handle_status(&playing(handle));
    assert!(orchestrator.sessions().is_active(handle));
}

#[test]
fn playing_without_a_session_leaves_no_activity_behind() {
    let client = MockClient::new();
    let orchestrator = PlaybackOrchestrator::new(client);
    let handle = ReceiverHandle(5);

    // No session was ever created for this handle; a stray poller push must
    // not leave an entry that nothing will ever clean up.
    orchestrator.handle_status(&playing(handle));
    assert!(!orchestrator.sessions().is_active(handle));
    assert!(orchestrator.sessions().is_empty());
}

#[test]
fn status_worker_drains_the_channel_into_the_orchestrator() {
    let dir = tempfile::tempdir().unwrap();
    let track = dir.path().join("a.mp3");
    touch(&track);

    let client = MockClient::new();
    let orchestrator = Arc::new(PlaybackOrchestrator::new(client.clone()));
    let catalog = Catalog::new(vec![media_entry(0, &track)]);

    orchestrator.request_playback(&catalog, 0, &[receiver("living-room")]);
    let handle = ReceiverHandle(1);

    let (tx, rx) = status_channel();
    let worker = spawn_status_worker(orchestrator.clone(), rx);

    tx.send(stopped(handle)).unwrap(); // absorbed
    tx.send(playing(handle)).unwrap();
    tx.send(stopped(handle)).unwrap(); // natural end
    drop(tx);
    worker.join().unwrap();

    assert!(!orchestrator.sessions().contains(handle));
    assert_eq!(client.disconnects(), 1);
}

#[test]
fn concurrent_requests_on_distinct_handles_do_not_corrupt_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let mut entries = Vec::new();
    for i in 0..8u32 {
        let track = dir.path().join(format!("t{i}.mp3"));
        touch(&track);
        entries.push(media_entry(i, &track));
    }

    let client = MockClient::new();
    let orchestrator = Arc::new(PlaybackOrchestrator::new(client.clone()));
    let catalog = Arc::new(Catalog::new(entries));

    let threads: Vec<_> = (0..8u32)
        .map(|i| {
            let orchestrator = orchestrator.clone();
            let catalog = catalog.clone();
            std::thread::spawn(move || {
                let result =
                    orchestrator.request_playback(&catalog, i, &[receiver(&format!("r{i}"))]);
                assert_eq!(result, PlayResult::Success);
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    // One session per handle, each freshly initialized.
    assert_eq!(orchestrator.sessions().len(), 8);
    for h in 1..=8u32 {
        let session = orchestrator.sessions().get(ReceiverHandle(h)).unwrap();
        assert!(!session.initialized);
        assert!(!session.has_playlist);
    }
    assert_eq!(client.cast_count(), 8);
}
