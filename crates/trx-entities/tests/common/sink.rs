use std::sync::{Mutex, PoisonError};

use trx_entities::DatagramLink;
use trx_entities::network::NetworkError;

/// A datagram link sink for testing purposes
/// Collects all sent datagrams for later inspection
pub struct SinkLink {
    name: String,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl SinkLink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sent: Mutex::new(vec![]),
        }
    }

    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl DatagramLink for SinkLink {
    fn send(&self, payload: &[u8]) -> Result<(), NetworkError> {
        tracing::debug!("{}: {} octets", self.name, payload.len());
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(payload.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sink {}", self.name)
    }
}
