use std::sync::Arc;

use trx_pdus::TxMsg;

use crate::trx::{Transceiver, TrxList};

/// Routes bursts between transceivers: a burst sent by one transceiver is received
/// by every other running transceiver listening on that timeslot and frequency.
pub struct BurstForwarder {
    trx_list: Arc<TrxList>,
}

impl BurstForwarder {
    pub fn new(trx_list: Arc<TrxList>) -> Self {
        Self { trx_list }
    }

    pub fn trx_list(&self) -> &Arc<TrxList> {
        &self.trx_list
    }

    /// Forward `msg` sent by `src`; returns the number of receivers it was handed to
    pub fn forward_msg(&self, src: &Transceiver, msg: &TxMsg) -> usize {
        // Snapshot the sender first; its lock is released before any receiver is locked
        let (tx_freq, src_info) = {
            let state = src.state();
            (state.tx_freq_at(msg.fn_num), state.src_info())
        };
        let Some(tx_freq) = tx_freq else {
            tracing::debug!(trx = %src, "Tx frequency not set, dropping {}", msg);
            return 0;
        };

        let mut delivered = 0;
        for dst in self.trx_list.iter() {
            if dst.id() == src.id() {
                continue;
            }
            let listening = {
                let state = dst.state();
                state.running && state.has_slot(msg.tn) && state.rx_freq_at(msg.fn_num) == Some(tx_freq)
            };
            if !listening {
                continue;
            }
            dst.deliver(&src_info, msg);
            delivered += 1;
        }

        tracing::trace!(trx = %src, "{} at {} Hz -> {} receiver(s)", msg, tx_freq, delivered);
        delivered
    }
}
