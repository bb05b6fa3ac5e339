//! # cmserver - RPC facade and network plumbing for CMCast
//!
//! Exposes the catalog and the playback orchestrator to clients as JSON
//! routes, serves media file bytes to receivers, and answers discovery
//! queries on UDP. The wire layer owns nothing: all playback semantics live
//! in cmcontrol.

pub mod api;
pub mod discovery;
pub mod media;
pub mod net;
pub mod records;

pub use api::{router, AppState, PlayReply, PlayRequest};
pub use discovery::{DiscoveryServer, QUERY_MAGIC};
pub use net::guess_local_ip;
pub use records::{to_records, CatalogRecord, RecordSource};
