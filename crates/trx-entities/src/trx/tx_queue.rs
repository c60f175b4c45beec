use std::sync::{Mutex, PoisonError};

use trx_core::gsm_time::fn_diff;
use trx_pdus::TxMsg;

/// Messages taken out of the queue at one clock tick
#[derive(Debug, Default)]
pub struct DueMsgs {
    /// Scheduled for exactly this frame
    pub emit: Vec<TxMsg>,
    /// Scheduled for a frame that has already passed
    pub stale: Vec<TxMsg>,
}

/// Bursts received from L1 ahead of their transmission frame.
///
/// Appended to from the receive path, drained from the clock thread. The lock is
/// only held while moving messages in or out.
#[derive(Default)]
pub struct TxQueue {
    queue: Mutex<Vec<TxMsg>>,
}

impl TxQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, msg: TxMsg) {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).push(msg);
    }

    pub fn clear(&self) {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove everything due at or before `fn_num`; later messages stay queued.
    /// Arrival order is kept within each group.
    pub fn take_due(&self, fn_num: u32) -> DueMsgs {
        let mut due = DueMsgs::default();
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let mut wait = Vec::with_capacity(queue.len());
        for msg in queue.drain(..) {
            match fn_diff(msg.fn_num, fn_num) {
                d if d < 0 => due.stale.push(msg),
                0 => due.emit.push(msg),
                _ => wait.push(msg),
            }
        }
        *queue = wait;
        due
    }
}
