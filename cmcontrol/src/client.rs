//! The narrow casting interface consumed by the orchestrator.

use std::path::Path;

use crate::errors::CastError;
use crate::receiver::ReceiverDescriptor;

/// Opaque identifier assigned by the casting client on a successful connect.
/// Keys every piece of per-receiver session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverHandle(pub u32);

impl std::fmt::Display for ReceiverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connect/cast/disconnect primitives of the casting protocol.
///
/// All calls are opaque synchronous operations returning success or failure;
/// the orchestrator holds no other assumptions about the transport. Status
/// notifications travel the other way, through the status event channel.
pub trait CastClient: Send + Sync {
    /// Connects to a receiver and returns the handle for the new connection.
    fn connect(&self, receiver: &ReceiverDescriptor) -> Result<ReceiverHandle, CastError>;

    /// Registers additional receivers as slaves of an existing connection.
    /// Slaves mirror whatever the primary plays and are not independently
    /// tracked.
    fn add_slaves(
        &self,
        handle: ReceiverHandle,
        slaves: &[ReceiverDescriptor],
    ) -> Result<(), CastError>;

    /// Starts playback of a single media file on a connection.
    fn cast(&self, handle: ReceiverHandle, media: &Path) -> Result<(), CastError>;

    /// Tears a connection down. Idempotent against unknown handles.
    fn disconnect(&self, handle: ReceiverHandle) -> Result<(), CastError>;
}
