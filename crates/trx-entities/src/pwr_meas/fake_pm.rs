use std::sync::Arc;

use rand::Rng;

use trx_config::CfgPwrMeas;
use trx_core::FreqHz;

use super::PowerMeasurement;
use crate::clock::ClockGen;
use crate::trx::TrxList;

/// Reports a strong signal on frequencies some running transceiver currently
/// transmits on, and noise everywhere else
pub struct FakePowerMeter {
    noise: (i16, i16),
    trx: (i16, i16),
    trx_list: Arc<TrxList>,
    clck_gen: Option<Arc<ClockGen>>,
}

impl FakePowerMeter {
    pub fn new(cfg: &CfgPwrMeas, trx_list: Arc<TrxList>, clck_gen: Option<Arc<ClockGen>>) -> Self {
        Self {
            noise: (cfg.noise_min, cfg.noise_max),
            trx: (cfg.trx_min, cfg.trx_max),
            trx_list,
            clck_gen,
        }
    }

    fn is_busy(&self, freq: FreqHz) -> bool {
        let fn_num = self.clck_gen.as_ref().map_or(0, |c| c.current_fn());
        self.trx_list.iter().any(|t| {
            let state = t.state();
            state.running && state.tx_freq_at(fn_num) == Some(freq)
        })
    }
}

impl PowerMeasurement for FakePowerMeter {
    fn measure(&self, freq: FreqHz) -> i16 {
        let (min, max) = if self.is_busy(freq) { self.trx } else { self.noise };
        rand::rng().random_range(min..=max)
    }
}
