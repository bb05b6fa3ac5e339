//! UDP discovery responder.
//!
//! Clients broadcast a query datagram on the discovery port; the responder
//! answers with `<service-name> <rpc-port>`. Runs on its own thread with a
//! short read timeout so `stop()` can take it down promptly.

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

/// Prefix a datagram must carry to be treated as a discovery query.
pub const QUERY_MAGIC: &[u8] = b"CMCAST_QUERY";

pub struct DiscoveryServer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    port: u16,
}

impl DiscoveryServer {
    /// Binds the responder and starts answering queries. Pass port 0 to let
    /// the OS pick one (used by tests).
    pub fn start(service: &str, port: u16, rpc_port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        socket.set_read_timeout(Some(Duration::from_secs(1)))?;
        let bound_port = socket.local_addr()?.port();

        let running = Arc::new(AtomicBool::new(true));
        let reply = format!("{service} {rpc_port}");

        let flag = running.clone();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 512];
            while flag.load(Ordering::Relaxed) {
                match socket.recv_from(&mut buf) {
                    Ok((len, peer)) => {
                        if !buf[..len].starts_with(QUERY_MAGIC) {
                            debug!(%peer, "ignoring non-query datagram");
                            continue;
                        }
                        if let Err(err) = socket.send_to(reply.as_bytes(), peer) {
                            warn!(%peer, error = %err, "failed to answer discovery query");
                        }
                    }
                    Err(err)
                        if err.kind() == io::ErrorKind::WouldBlock
                            || err.kind() == io::ErrorKind::TimedOut =>
                    {
                        continue;
                    }
                    Err(err) => {
                        warn!(error = %err, "discovery socket error, stopping responder");
                        break;
                    }
                }
            }
            debug!("discovery responder exiting");
        });

        info!(port = bound_port, "discovery responder started");
        Ok(Self {
            running,
            handle: Some(handle),
            port: bound_port,
        })
    }

    /// Port the responder is actually bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stops the responder and joins its thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        info!("discovery responder stopped");
    }
}

impl Drop for DiscoveryServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_queries_with_service_and_port() {
        let mut server = DiscoveryServer::start("cmcast", 0, 4004).unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        client
            .send_to(QUERY_MAGIC, ("127.0.0.1", server.port()))
            .unwrap();

        let mut buf = [0u8; 128];
        let (len, _) = client.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"cmcast 4004");

        server.stop();
    }

    #[test]
    fn ignores_datagrams_without_the_query_magic() {
        let mut server = DiscoveryServer::start("cmcast", 0, 4004).unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_millis(300)))
            .unwrap();
        client
            .send_to(b"unrelated", ("127.0.0.1", server.port()))
            .unwrap();

        let mut buf = [0u8; 128];
        assert!(client.recv_from(&mut buf).is_err());

        server.stop();
    }

    #[test]
    fn stop_is_idempotent() {
        let mut server = DiscoveryServer::start("cmcast", 0, 4004).unwrap();
        server.stop();
        server.stop();
    }
}
