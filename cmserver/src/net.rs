//! Small networking helpers.

use std::net::UdpSocket;

/// Guesses the machine's outward-facing local IP.
///
/// Binds an unconnected UDP socket and asks the OS which interface would be
/// used to reach a public address; no packet is actually sent. Falls back to
/// `127.0.0.1` when nothing can be determined.
pub fn guess_local_ip() -> String {
    match UdpSocket::bind("0.0.0.0:0") {
        Ok(socket) => {
            if socket.connect("8.8.8.8:80").is_ok() {
                if let Ok(local_addr) = socket.local_addr() {
                    return local_addr.ip().to_string();
                }
            }
            "127.0.0.1".to_string()
        }
        Err(_) => "127.0.0.1".to_string(),
    }
}
