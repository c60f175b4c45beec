//! RF path impairment simulation, applied by the receiving transceiver.
//!
//! - RSSI is either a fake base +/- threshold, or the sender's transmit power minus
//!   its attenuation and a fixed path loss
//! - ToA256 is base +/- threshold, advanced by the sender's timing advance
//! - C/I (TRXDv1+) is base +/- threshold
//! - A burst drop budget turns selected bursts into NOPE indications (or nothing, for TRXDv0)

use rand::Rng;

use trx_config::CfgSim;
use trx_core::modulation::GMSK_BURST_LEN;
use trx_core::train_seq::TrainingSeq;
use trx_core::Modulation;
use trx_pdus::trxd::msgs::{CI_MAX, CI_MIN, RSSI_MAX, RSSI_MIN};
use trx_pdus::{RxMsg, TxMsg};

pub const NOPE_RSSI: i16 = -110;
pub const NOPE_TOA256: i16 = 0;
pub const NOPE_CI: i16 = -30;

/// Highest timing advance accepted by SETTA
pub const TA_MAX: u8 = 63;

/// Simulation parameters of one receiving transceiver, adjustable at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimParams {
    pub toa256_base: i32,
    pub toa256_threshold: i32,
    pub rssi_base: i32,
    pub rssi_threshold: i32,
    pub fake_rssi: bool,
    pub ci_base: i32,
    pub ci_threshold: i32,
    pub path_loss: i32,
    /// Timing advance this transceiver applies to its own transmissions
    pub ta: u8,
    /// Number of bursts still to drop
    pub drop_amount: u32,
    /// Only bursts with `fn % drop_period == 0` are dropped
    pub drop_period: u32,
}

impl From<&CfgSim> for SimParams {
    fn from(cfg: &CfgSim) -> Self {
        Self {
            toa256_base: cfg.toa256_base as i32,
            toa256_threshold: cfg.toa256_threshold as i32,
            rssi_base: cfg.rssi_base as i32,
            rssi_threshold: cfg.rssi_threshold as i32,
            fake_rssi: cfg.fake_rssi,
            ci_base: cfg.ci_base as i32,
            ci_threshold: cfg.ci_threshold as i32,
            path_loss: cfg.path_loss as i32,
            ta: 0,
            drop_amount: 0,
            drop_period: 1,
        }
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self::from(&CfgSim::default())
    }
}

/// What the receiver needs to know about the sending transceiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcInfo {
    /// Nominal transmit power minus the SETPOWER attenuation, in dBm
    pub tx_power: i32,
    pub ta: u8,
    pub rf_muted: bool,
}

fn randomize<R: Rng>(rng: &mut R, base: i32, threshold: i32) -> i64 {
    let base = base as i64;
    if threshold <= 0 {
        return base;
    }
    let threshold = threshold as i64;
    rng.random_range(base - threshold..=base + threshold)
}

fn clamp_i16(value: i64, min: i16, max: i16) -> i16 {
    value.clamp(min as i64, max as i64) as i16
}

impl SimParams {
    /// Consumes one unit of the drop budget if `fn_num` is selected for dropping
    pub fn take_drop(&mut self, fn_num: u32) -> bool {
        if self.drop_amount == 0 || fn_num % self.drop_period.max(1) != 0 {
            return false;
        }
        self.drop_amount -= 1;
        true
    }

    fn rssi<R: Rng>(&self, rng: &mut R, src: &SrcInfo, tx_pwr: u8) -> i16 {
        let rssi = if self.fake_rssi {
            randomize(rng, self.rssi_base, self.rssi_threshold)
        } else {
            src.tx_power as i64 - tx_pwr as i64 - self.path_loss as i64
        };
        clamp_i16(rssi, RSSI_MIN, RSSI_MAX)
    }

    fn toa256<R: Rng>(&self, rng: &mut R, src: &SrcInfo) -> i16 {
        let toa256 = randomize(rng, self.toa256_base, self.toa256_threshold) - src.ta as i64 * 256;
        clamp_i16(toa256, i16::MIN, i16::MAX)
    }

    fn ci<R: Rng>(&self, rng: &mut R) -> i16 {
        clamp_i16(randomize(rng, self.ci_base, self.ci_threshold), CI_MIN, CI_MAX)
    }

    /// Turns a burst sent by `src` into what this receiver delivers to its L1 using
    /// header version `ver`. None means nothing is delivered at all.
    pub fn simulate<R: Rng>(&mut self, rng: &mut R, src: &SrcInfo, tx: &TxMsg, ver: u8) -> Option<RxMsg> {
        let mut msg = tx.to_rx(ver);

        if src.rf_muted || msg.burst.is_none() {
            return nope_ind(msg);
        }
        if self.take_drop(tx.fn_num) {
            tracing::debug!("Simulation: dropping burst (fn={} % {} == 0)", tx.fn_num, self.drop_period);
            return nope_ind(msg);
        }

        msg.rssi = self.rssi(rng, src, tx.pwr);
        msg.toa256 = self.toa256(rng, src);
        if ver >= 1 {
            msg.ci = self.ci(rng);
            if let Some(ts) = tx.burst.as_deref().and_then(pick_gmsk_tsc) {
                msg.modulation = Modulation::Gmsk;
                msg.tsc_set = ts.tsc_set;
                msg.tsc = ts.tsc;
            }
        }
        Some(msg)
    }
}

fn pick_gmsk_tsc(burst: &[u8]) -> Option<&'static TrainingSeq> {
    if burst.len() != GMSK_BURST_LEN {
        return None;
    }
    TrainingSeq::pick(burst)
}

/// Replace a message by a NOPE / IDLE indication; TRXDv0 cannot express one
fn nope_ind(mut msg: RxMsg) -> Option<RxMsg> {
    if msg.ver == 0 {
        return None;
    }
    msg.nope_ind = true;
    msg.burst = None;
    msg.modulation = Modulation::Gmsk;
    msg.tsc_set = 0;
    msg.tsc = 0;
    msg.rssi = NOPE_RSSI;
    msg.toa256 = NOPE_TOA256;
    msg.ci = NOPE_CI;
    Some(msg)
}
