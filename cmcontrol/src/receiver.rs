//! Receiver descriptors as supplied by callers.

/// One receiver named in a play request. Transient: built per request from
/// caller input, never stored in session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverDescriptor {
    pub name: String,
    pub ipv4: String,
    pub ipv6: String,
}

impl ReceiverDescriptor {
    /// Preferred address for connecting: IPv4 when present, IPv6 otherwise.
    pub fn address(&self) -> &str {
        if !self.ipv4.is_empty() {
            &self.ipv4
        } else {
            &self.ipv6
        }
    }
}
