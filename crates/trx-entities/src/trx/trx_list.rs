use std::net::IpAddr;

use super::{Transceiver, TrxId};
use crate::clock::{ClockError, ClockGen};

/// All transceivers of the process, created once at startup.
/// Parent/child relations are resolved here and never change afterwards.
pub struct TrxList {
    trx: Vec<Transceiver>,
}

impl TrxList {
    /// Takes transceivers ordered by their ids; each child must follow its parent
    pub fn new(mut trx: Vec<Transceiver>) -> Self {
        for idx in 0..trx.len() {
            debug_assert_eq!(trx[idx].id(), TrxId(idx));
            if trx[idx].child_idx() == 0 {
                continue;
            }
            let parent = trx[..idx].iter().position(|p| trx[idx].cfg().is_child_of(p.cfg()));
            match parent {
                Some(p) => trx[p].children.push(TrxId(idx)),
                None => tracing::warn!(trx = %trx[idx], "Child transceiver without parent"),
            }
        }
        Self { trx }
    }

    pub fn get(&self, id: TrxId) -> Option<&Transceiver> {
        self.trx.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transceiver> {
        self.trx.iter()
    }

    pub fn len(&self) -> usize {
        self.trx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trx.is_empty()
    }

    pub fn find(&self, remote_addr: IpAddr, base_port: u16, child_idx: u8) -> Option<TrxId> {
        self.trx
            .iter()
            .find(|t| {
                let cfg = t.cfg();
                cfg.remote_addr == remote_addr && cfg.base_port == base_port && cfg.child_idx == child_idx
            })
            .map(Transceiver::id)
    }

    /// POWERON / POWEROFF of transceiver `id`.
    ///
    /// A primary transceiver with child management applies the new power state to its
    /// children too. Powering off clears the transmit queue and disables hopping. The
    /// clock generator runs while at least one clock link is subscribed.
    pub fn power_event(&self, id: TrxId, poweron: bool, clck_gen: Option<&ClockGen>) -> Result<(), ClockError> {
        let Some(trx) = self.get(id) else {
            return Ok(());
        };

        let mut targets = vec![id];
        if trx.cfg().child_mgt && trx.child_idx() == 0 {
            targets.extend_from_slice(trx.children());
        }
        for t in targets.iter().filter_map(|&t| self.get(t)) {
            {
                let mut state = t.state_mut();
                state.running = poweron;
                if !poweron {
                    state.fh = None;
                }
            }
            if !poweron {
                t.tx_queue().clear();
            }
        }

        let (Some(clck_gen), Some(link)) = (clck_gen, trx.clck_link()) else {
            return Ok(());
        };
        if poweron {
            clck_gen.add_link(id.0, link.clone());
        } else {
            clck_gen.remove_link(id.0);
        }

        if !clck_gen.is_running() && clck_gen.num_links() > 0 {
            clck_gen.start()?;
        } else if clck_gen.is_running() && clck_gen.num_links() == 0 {
            clck_gen.stop();
        }
        Ok(())
    }
}
