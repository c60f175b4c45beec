use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use trx_config::CfgTrx;
use trx_core::{FreqHz, HoppingParams, NUM_TIMESLOTS};
use trx_pdus::{CtrlRsp, TxMsg};

use super::TrxId;
use super::rf_sim::{SimParams, SrcInfo};
use super::tx_queue::TxQueue;
use crate::fwd::BurstForwarder;
use crate::network::DatagramLink;

/// Links of one transceiver towards its L1
#[derive(Clone)]
pub struct TrxLinks {
    pub data: Arc<dyn DatagramLink>,
    pub ctrl: Arc<dyn DatagramLink>,
    /// Only present for a primary transceiver driving a clock
    pub clck: Option<Arc<dyn DatagramLink>>,
}

/// Control state, written by the control interpreter and read from the clock thread
#[derive(Debug, Clone)]
pub struct TrxState {
    pub running: bool,
    pub rx_freq: Option<FreqHz>,
    pub tx_freq: Option<FreqHz>,
    /// Active timeslots, bit N set for TN=N
    pub ts_mask: u8,
    pub fh: Option<HoppingParams>,
    /// Negotiated TRXD header version
    pub hdr_ver: u8,
    pub sim: SimParams,
    /// Nominal transmit power in dBm
    pub tx_power_base: i32,
    /// Attenuation set with SETPOWER, in dB
    pub tx_att_base: i32,
    pub rf_muted: bool,
}

impl TrxState {
    fn new(cfg: &CfgTrx) -> Self {
        Self {
            running: false,
            rx_freq: None,
            tx_freq: None,
            ts_mask: 0,
            fh: None,
            hdr_ver: 0,
            sim: SimParams::from(&cfg.sim),
            tx_power_base: cfg.sim.tx_power_base as i32,
            tx_att_base: 0,
            rf_muted: false,
        }
    }

    /// Tuned to fixed frequencies, or hopping
    pub fn ready(&self) -> bool {
        (self.rx_freq.is_some() && self.tx_freq.is_some()) || self.fh.is_some()
    }

    pub fn rx_freq_at(&self, fn_num: u32) -> Option<FreqHz> {
        match &self.fh {
            Some(fh) => Some(fh.resolve(fn_num).0),
            None => self.rx_freq,
        }
    }

    pub fn tx_freq_at(&self, fn_num: u32) -> Option<FreqHz> {
        match &self.fh {
            Some(fh) => Some(fh.resolve(fn_num).1),
            None => self.tx_freq,
        }
    }

    pub fn set_slot(&mut self, tn: u8, active: bool) {
        debug_assert!(tn < NUM_TIMESLOTS);
        if active {
            self.ts_mask |= 1 << tn;
        } else {
            self.ts_mask &= !(1 << tn);
        }
    }

    pub fn has_slot(&self, tn: u8) -> bool {
        tn < NUM_TIMESLOTS && self.ts_mask & (1 << tn) != 0
    }

    pub fn src_info(&self) -> SrcInfo {
        SrcInfo {
            tx_power: self.tx_power_base.saturating_sub(self.tx_att_base),
            ta: self.sim.ta,
            rf_muted: self.rf_muted,
        }
    }
}

/// One simulated transceiver
pub struct Transceiver {
    id: TrxId,
    cfg: CfgTrx,
    /// Transceivers sharing our clock and, with `child_mgt`, our power state
    pub(super) children: Vec<TrxId>,
    state: RwLock<TrxState>,
    tx_queue: TxQueue,
    links: TrxLinks,
}

impl Transceiver {
    pub fn new(id: TrxId, cfg: CfgTrx, links: TrxLinks) -> Self {
        debug_assert!(links.clck.is_none() || cfg.child_idx == 0, "child transceiver cannot have its own clock");
        let state = RwLock::new(TrxState::new(&cfg));
        let trx = Self {
            id,
            cfg,
            children: Vec::new(),
            state,
            tx_queue: TxQueue::new(),
            links,
        };
        tracing::info!(trx = %trx, "Init transceiver");
        trx
    }

    pub fn id(&self) -> TrxId {
        self.id
    }

    pub fn cfg(&self) -> &CfgTrx {
        &self.cfg
    }

    pub fn child_idx(&self) -> u8 {
        self.cfg.child_idx
    }

    pub fn children(&self) -> &[TrxId] {
        &self.children
    }

    pub fn clck_link(&self) -> Option<&Arc<dyn DatagramLink>> {
        self.links.clck.as_ref()
    }

    /// Read guard for control state.
    pub fn state(&self) -> RwLockReadGuard<'_, TrxState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write guard for control state.
    pub fn state_mut(&self) -> RwLockWriteGuard<'_, TrxState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    pub fn tx_queue(&self) -> &TxQueue {
        &self.tx_queue
    }

    /// Decode a TRXD datagram from L1 and queue its bursts for transmission
    pub fn recv_data_msg(&self, data: &[u8]) -> usize {
        let msgs = match TxMsg::batch_from_bytes(data) {
            Ok(msgs) => msgs,
            Err(e) => {
                tracing::warn!(trx = %self, "Malformed TRXD message ({} octets): {}", data.len(), e);
                return 0;
            }
        };

        if !self.is_running() {
            tracing::warn!(trx = %self, "RX TRXD message ({} burst(s)), but transceiver is not running => dropping", msgs.len());
            return 0;
        }

        let num = msgs.len();
        for msg in msgs {
            tracing::trace!(trx = %self, "queue {}", msg);
            self.tx_queue.push(msg);
        }
        num
    }

    /// Release the bursts due at `fn_num` to the forwarder
    pub fn clck_tick(&self, fwd: &BurstForwarder, fn_num: u32) {
        if !self.is_running() {
            return;
        }

        let due = self.tx_queue.take_due(fn_num);
        for msg in &due.emit {
            fwd.forward_msg(self, msg);
        }
        for msg in &due.stale {
            tracing::warn!(trx = %self, "Stale TRXD message (fn={}): {}", fn_num, msg);
        }
    }

    /// Receive a burst sent by another transceiver, simulate the RF path and pass it to L1
    pub fn deliver(&self, src: &SrcInfo, tx: &TxMsg) {
        let rx = {
            let mut state = self.state_mut();
            let ver = state.hdr_ver;
            state.sim.simulate(&mut rand::rng(), src, tx, ver)
        };
        let Some(rx) = rx else {
            return;
        };

        let encoded = if self.cfg.legacy_padding {
            rx.to_bytes_legacy()
        } else {
            rx.to_bytes()
        };
        match encoded {
            Ok(pdu) => {
                tracing::trace!(trx = %self, "send {}", rx);
                if let Err(e) = self.links.data.send(&pdu) {
                    tracing::warn!(trx = %self, "{}", e);
                }
            }
            Err(e) => tracing::error!(trx = %self, "Failed to encode {}: {}", rx, e),
        }
    }

    pub fn send_ctrl_rsp(&self, rsp: &CtrlRsp) {
        tracing::debug!(trx = %self, "Send {}", rsp);
        if let Err(e) = self.links.ctrl.send(&rsp.to_bytes()) {
            tracing::warn!(trx = %self, "{}", e);
        }
    }
}

impl fmt::Display for Transceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.cfg.name {
            write!(f, "{}@", name)?;
        }
        write!(f, "{}:{}", self.cfg.remote_addr, self.cfg.base_port)?;
        if self.cfg.child_idx > 0 {
            write!(f, "/{}", self.cfg.child_idx)?;
        }
        Ok(())
    }
}
