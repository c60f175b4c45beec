pub mod event_loop;
pub mod udp_link;

pub use event_loop::{Event, LinkId, LinkKind, ReaderPool};
pub use udp_link::UdpLink;

/// Datagram link towards a Layer-1 peer.
///
/// Implemented by [`UdpLink`] for real sockets; the simulation core only ever
/// sends through this trait, which lets tests capture the traffic instead.
pub trait DatagramLink: Send + Sync {
    /// Send one datagram to the remote peer
    fn send(&self, payload: &[u8]) -> Result<(), NetworkError>;

    /// Human readable description of the link, for logging
    fn describe(&self) -> String;
}

/// Network-related errors
#[derive(Debug, Clone)]
pub enum NetworkError {
    BindFailed(String),
    SendFailed(String),
    SpawnFailed(String),
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::BindFailed(msg) => write!(f, "Bind failed: {}", msg),
            NetworkError::SendFailed(msg) => write!(f, "Send failed: {}", msg),
            NetworkError::SpawnFailed(msg) => write!(f, "Failed to spawn reader thread: {}", msg),
        }
    }
}

impl std::error::Error for NetworkError {}
