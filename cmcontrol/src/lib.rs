//! # cmcontrol - Playback orchestration for CMCast
//!
//! The core of the server: resolving a play request into a primary+slave
//! receiver topology, tracking per-receiver playback sessions, and reacting
//! to asynchronous status events to advance playlists or tear sessions down.
//!
//! The casting protocol itself is consumed through the narrow [`CastClient`]
//! trait; the bundled [`ChromecastClient`] implements it over the Cast v2
//! protocol and feeds status events back through a crossbeam channel.

pub mod chromecast;
pub mod client;
pub mod errors;
pub mod orchestrator;
pub mod receiver;
pub mod session;
pub mod status;

pub use chromecast::ChromecastClient;
pub use client::{CastClient, ReceiverHandle};
pub use errors::CastError;
pub use orchestrator::{PlayResult, PlaybackOrchestrator};
pub use receiver::ReceiverDescriptor;
pub use session::{PlaybackSession, SessionStore};
pub use status::{spawn_status_worker, status_channel, ReceiverStatus, StatusEvent};
