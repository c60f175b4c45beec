use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

use super::NetworkError;
use super::udp_link::MAX_DATAGRAM_LEN;
use crate::trx::TrxId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Ctrl,
    Data,
}

/// Identifies which socket of which transceiver a datagram arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId {
    pub trx: TrxId,
    pub kind: LinkKind,
}

/// Everything the main loop reacts to
#[derive(Debug)]
pub enum Event {
    Datagram { link: LinkId, data: Vec<u8> },
    Shutdown,
}

/// One blocking reader thread per socket, all feeding the same event channel.
/// The main loop only ever waits on that channel.
pub struct ReaderPool {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl ReaderPool {
    pub fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    pub fn spawn(&mut self, socket: UdpSocket, link: LinkId, sender: Sender<Event>) -> Result<(), NetworkError> {
        let stop = Arc::clone(&self.stop);
        let name = format!("rx-trx{}-{:?}", link.trx.0, link.kind).to_lowercase();
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || read_loop(socket, link, sender, stop))
            .map_err(|e| NetworkError::SpawnFailed(e.to_string()))?;
        self.handles.push(handle);
        Ok(())
    }

    /// Signal all readers and wait for them; each notices within one read timeout
    pub fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!("reader thread panicked");
            }
        }
    }
}

impl Default for ReaderPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ReaderPool {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn read_loop(socket: UdpSocket, link: LinkId, sender: Sender<Event>, stop: Arc<AtomicBool>) {
    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    while !stop.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((len, _from)) => {
                let event = Event::Datagram {
                    link,
                    data: buf[..len].to_vec(),
                };
                if sender.send(event).is_err() {
                    // Main loop is gone
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => continue,
            Err(e) => {
                // e.g. ICMP port unreachable reported on a later read; not fatal for UDP
                tracing::debug!("{:?} link of trx {} recv error: {}", link.kind, link.trx.0, e);
            }
        }
    }
}
