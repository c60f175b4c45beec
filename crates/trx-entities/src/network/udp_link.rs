use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use super::{DatagramLink, NetworkError};

/// Blocking reads return after this long so reader threads can notice shutdown
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Receive buffer size, large enough for any UDP payload
pub const MAX_DATAGRAM_LEN: usize = 65536;

/// UDP socket bound locally, sending to one fixed remote peer
pub struct UdpLink {
    socket: UdpSocket,
    local: SocketAddr,
    remote: SocketAddr,
}

impl UdpLink {
    pub fn bind(local: SocketAddr, remote: SocketAddr) -> Result<Self, NetworkError> {
        let socket = UdpSocket::bind(local).map_err(|e| NetworkError::BindFailed(format!("{}: {}", local, e)))?;
        socket
            .set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|e| NetworkError::BindFailed(format!("Failed to set timeout: {}", e)))?;
        let local = socket.local_addr().unwrap_or(local);
        Ok(Self { socket, local, remote })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Independent handle to the same socket, for a reader thread
    pub fn try_clone_socket(&self) -> Result<UdpSocket, NetworkError> {
        self.socket
            .try_clone()
            .map_err(|e| NetworkError::BindFailed(format!("Failed to clone socket {}: {}", self.local, e)))
    }
}

impl DatagramLink for UdpLink {
    fn send(&self, payload: &[u8]) -> Result<(), NetworkError> {
        self.socket
            .send_to(payload, self.remote)
            .map_err(|e| NetworkError::SendFailed(format!("UDP send to {} failed: {}", self.remote, e)))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} -> {}", self.local, self.remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_link_loopback() {
        let a = UdpLink::bind("127.0.0.1:0".parse().unwrap(), "127.0.0.1:9".parse().unwrap()).unwrap();
        let b = UdpLink::bind("127.0.0.1:0".parse().unwrap(), a.local_addr()).unwrap();

        b.send(b"IND CLOCK 42\0").unwrap();
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        let (len, from) = a.try_clone_socket().unwrap().recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"IND CLOCK 42\0");
        assert_eq!(from, b.local_addr());
    }

    #[test]
    fn test_bind_conflict() {
        let a = UdpLink::bind("127.0.0.1:0".parse().unwrap(), "127.0.0.1:9".parse().unwrap()).unwrap();
        assert!(matches!(
            UdpLink::bind(a.local_addr(), "127.0.0.1:9".parse().unwrap()),
            Err(NetworkError::BindFailed(_))
        ));
    }
}
