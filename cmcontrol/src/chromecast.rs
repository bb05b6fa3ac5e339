//! Chromecast backend for the [`CastClient`] trait, built on the rust_cast
//! library (Cast v2, Protocol Buffers over TLS).
//!
//! Connections are re-established per operation to avoid holding the TLS
//! stream across threads. Each primary connection gets a poller thread that
//! samples the media status about once a second and pushes a [`StatusEvent`]
//! for every observed transition; the first observed state is always pushed,
//! which produces the synthetic post-connect Stopped event the orchestrator
//! absorbs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use rust_cast::channels::media::{Media, PlayerState, StreamType};
use rust_cast::channels::receiver::CastDeviceApp;
use rust_cast::CastDevice;
use tracing::{debug, info, warn};

use crate::client::{CastClient, ReceiverHandle};
use crate::errors::CastError;
use crate::receiver::ReceiverDescriptor;
use crate::status::{ReceiverStatus, StatusEvent};

/// Default Chromecast port.
const DEFAULT_CHROMECAST_PORT: u16 = 8009;

/// Interval between status polls on an active connection.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Session identifiers cached between reconnects.
#[derive(Debug, Default)]
struct SessionIds {
    /// Receiver session obtained when launching the media receiver app.
    receiver_session_id: Option<String>,
    /// Media session obtained when loading media.
    media_session_id: Option<i32>,
    /// Destination transport id (usually "web-0").
    destination_id: Option<String>,
}

/// One receiver endpoint (primary or slave).
struct Endpoint {
    name: String,
    host: String,
    port: u16,
    session: Mutex<SessionIds>,
}

impl Endpoint {
    fn from_descriptor(receiver: &ReceiverDescriptor) -> Self {
        Self {
            name: receiver.name.clone(),
            host: receiver.address().to_string(),
            port: DEFAULT_CHROMECAST_PORT,
            session: Mutex::new(SessionIds::default()),
        }
    }

    /// Fresh connection for one operation.
    fn device(&self) -> Result<CastDevice<'_>, CastError> {
        CastDevice::connect(self.host.as_str(), self.port)
            .map_err(|e| CastError::Unreachable(format!("{} ({}): {}", self.name, self.host, e)))
    }

    /// Connects and queries the receiver once, verifying reachability.
    fn probe(&self) -> Result<(), CastError> {
        let device = self.device()?;
        device.receiver.get_status().map_err(CastError::backend)?;
        Ok(())
    }

    /// Loads a media URL, launching the default media receiver app first if
    /// no session exists yet.
    fn load(&self, url: &str, content_type: &str) -> Result<(), CastError> {
        let device = self.device()?;

        let mut session = self.session.lock().unwrap();
        if session.receiver_session_id.is_none() {
            debug!(receiver = self.name.as_str(), "launching default media receiver app");
            let app = device
                .receiver
                .launch_app(&CastDeviceApp::DefaultMediaReceiver)
                .map_err(CastError::backend)?;
            session.receiver_session_id = Some(app.session_id.clone());
            session.destination_id = Some(app.transport_id.clone());
        }
        let destination = session
            .destination_id
            .clone()
            .ok_or_else(|| CastError::backend("no destination id"))?;
        let receiver_session = session
            .receiver_session_id
            .clone()
            .ok_or_else(|| CastError::backend("no receiver session id"))?;
        drop(session);

        let media = Media {
            content_id: url.to_string(),
            content_type: content_type.to_string(),
            stream_type: StreamType::Buffered,
            duration: None,
            metadata: None,
        };

        let status = device
            .media
            .load(&destination, &receiver_session, &media)
            .map_err(CastError::backend)?;

        let mut session = self.session.lock().unwrap();
        if let Some(entry) = status.entries.first() {
            session.media_session_id = Some(entry.media_session_id);
        }
        Ok(())
    }

    /// Stops the app session, if any. Failures are logged only.
    fn shutdown(&self) {
        let receiver_session = {
            let mut session = self.session.lock().unwrap();
            let id = session.receiver_session_id.take();
            session.media_session_id = None;
            session.destination_id = None;
            id
        };
        let Some(receiver_session) = receiver_session else {
            return;
        };
        match self.device() {
            Ok(device) => {
                if let Err(e) = device.receiver.stop_app(receiver_session) {
                    warn!(receiver = self.name.as_str(), error = %e, "failed to stop receiver app");
                }
            }
            Err(e) => {
                warn!(receiver = self.name.as_str(), error = %e, "cannot reach receiver for shutdown");
            }
        }
    }

    /// Samples the receiver once.
    fn observe(&self) -> Result<Observed, CastError> {
        let device = self.device()?;

        let (receiver_session, destination, media_session) = {
            let session = self.session.lock().unwrap();
            (
                session.receiver_session_id.clone(),
                session.destination_id.clone(),
                session.media_session_id,
            )
        };

        // Nothing launched yet: the receiver is idle from our point of view.
        let (Some(receiver_session), Some(destination)) = (receiver_session, destination) else {
            return Ok(Observed::Stopped);
        };

        let receiver_status = device.receiver.get_status().map_err(CastError::backend)?;
        let session_alive = receiver_status
            .applications
            .iter()
            .any(|app| app.session_id == receiver_session);
        if !session_alive {
            // Our app was dismissed at the receiver side.
            return Ok(Observed::Gone);
        }

        let media_status = device
            .media
            .get_status(&destination, media_session)
            .map_err(CastError::backend)?;

        let state = match media_status.entries.first() {
            Some(entry) => match entry.player_state {
                PlayerState::Playing | PlayerState::Buffering | PlayerState::Paused => {
                    Observed::Playing
                }
                PlayerState::Idle => Observed::Stopped,
            },
            None => Observed::Stopped,
        };
        Ok(state)
    }
}

/// State observed by one poll of a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observed {
    Playing,
    Stopped,
    /// Our app session disappeared from the receiver: user-initiated stop.
    Gone,
}

struct Connection {
    primary: Endpoint,
    slaves: Mutex<Vec<Endpoint>>,
    stop: AtomicBool,
}

/// [`CastClient`] implementation speaking the Cast v2 protocol.
///
/// Media is delivered to receivers as URLs under `media_base_url`, served by
/// the cmserver media route.
pub struct ChromecastClient {
    media_base_url: String,
    events: Sender<StatusEvent>,
    next_handle: AtomicU32,
    connections: Mutex<HashMap<ReceiverHandle, Arc<Connection>>>,
}

impl ChromecastClient {
    pub fn new(media_base_url: impl Into<String>, events: Sender<StatusEvent>) -> Self {
        Self {
            media_base_url: media_base_url.into().trim_end_matches('/').to_string(),
            events,
            next_handle: AtomicU32::new(1),
            connections: Mutex::new(HashMap::new()),
        }
    }

    fn connection(&self, handle: ReceiverHandle) -> Result<Arc<Connection>, CastError> {
        let connections = self.connections.lock().unwrap();
        connections
            .get(&handle)
            .cloned()
            .ok_or(CastError::UnknownHandle(handle.0))
    }

    fn media_url(&self, media: &Path) -> Result<(String, &'static str), CastError> {
        let path = media
            .to_str()
            .ok_or_else(|| CastError::UnsupportedMedia(media.to_path_buf()))?;
        let content_type = cmcatalog::mime_for_path(media).unwrap_or("application/octet-stream");
        let url = format!("{}/media?path={}", self.media_base_url, urlencoding::encode(path));
        Ok((url, content_type))
    }

    /// Polls the primary endpoint until the connection is dropped, pushing a
    /// status event on every observed transition.
    fn run_poller(connection: Arc<Connection>, handle: ReceiverHandle, events: Sender<StatusEvent>) {
        let mut last: Option<Observed> = None;
        while !connection.stop.load(Ordering::Relaxed) {
            let observed = match connection.primary.observe() {
                Ok(observed) => observed,
                Err(err) => {
                    debug!(%handle, error = %err, "status poll failed, retrying");
                    thread::sleep(POLL_INTERVAL);
                    continue;
                }
            };

            if last != Some(observed) {
                last = Some(observed);
                let event = match observed {
                    Observed::Playing => StatusEvent {
                        handle,
                        status: ReceiverStatus::Playing,
                        stopped_by_user: false,
                    },
                    Observed::Stopped => StatusEvent {
                        handle,
                        status: ReceiverStatus::Stopped,
                        stopped_by_user: false,
                    },
                    Observed::Gone => StatusEvent {
                        handle,
                        status: ReceiverStatus::Stopped,
                        stopped_by_user: true,
                    },
                };
                if events.send(event).is_err() {
                    // Consumer went away; the process is shutting down.
                    return;
                }
            }

            thread::sleep(POLL_INTERVAL);
        }
        debug!(%handle, "status poller exiting");
    }
}

impl CastClient for ChromecastClient {
    fn connect(&self, receiver: &ReceiverDescriptor) -> Result<ReceiverHandle, CastError> {
        let endpoint = Endpoint::from_descriptor(receiver);
        endpoint.probe()?;

        let handle = ReceiverHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let connection = Arc::new(Connection {
            primary: endpoint,
            slaves: Mutex::new(Vec::new()),
            stop: AtomicBool::new(false),
        });

        {
            let mut connections = self.connections.lock().unwrap();
            connections.insert(handle, connection.clone());
        }

        let events = self.events.clone();
        thread::spawn(move || Self::run_poller(connection, handle, events));

        info!(receiver = receiver.name.as_str(), %handle, "connected to receiver");
        Ok(handle)
    }

    fn add_slaves(
        &self,
        handle: ReceiverHandle,
        slaves: &[ReceiverDescriptor],
    ) -> Result<(), CastError> {
        let connection = self.connection(handle)?;

        let mut failed = Vec::new();
        for descriptor in slaves {
            let endpoint = Endpoint::from_descriptor(descriptor);
            match endpoint.probe() {
                Ok(()) => {
                    let mut registered = connection.slaves.lock().unwrap();
                    registered.push(endpoint);
                }
                Err(err) => {
                    warn!(slave = descriptor.name.as_str(), error = %err, "slave unreachable");
                    failed.push(descriptor.name.clone());
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(CastError::Backend(format!(
                "unreachable slaves: {}",
                failed.join(", ")
            )))
        }
    }

    fn cast(&self, handle: ReceiverHandle, media: &Path) -> Result<(), CastError> {
        let connection = self.connection(handle)?;
        let (url, content_type) = self.media_url(media)?;

        debug!(%handle, url = url.as_str(), "loading media");
        connection.primary.load(&url, content_type)?;

        // Slaves mirror the primary, best effort.
        let slaves = connection.slaves.lock().unwrap();
        for slave in slaves.iter() {
            if let Err(err) = slave.load(&url, content_type) {
                warn!(slave = slave.name.as_str(), error = %err, "slave cast failed");
            }
        }
        Ok(())
    }

    fn disconnect(&self, handle: ReceiverHandle) -> Result<(), CastError> {
        let connection = {
            let mut connections = self.connections.lock().unwrap();
            connections.remove(&handle)
        };
        // Unknown handles count as already disconnected.
        let Some(connection) = connection else {
            return Ok(());
        };

        connection.stop.store(true, Ordering::Relaxed);
        connection.primary.shutdown();
        let slaves = connection.slaves.lock().unwrap();
        for slave in slaves.iter() {
            slave.shutdown();
        }

        info!(%handle, "disconnected receiver");
        Ok(())
    }
}
