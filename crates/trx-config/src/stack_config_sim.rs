use std::collections::HashMap;

use serde::Deserialize;
use toml::Value;

/// RF impairment simulation parameters of one transceiver, applied to bursts it receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgSim {
    /// Timing of arrival base, in 1/256 symbol periods
    pub toa256_base: i16,
    /// ToA randomization threshold; 0 disables randomization
    pub toa256_threshold: i16,
    /// RSSI base in dBm, used when `fake_rssi` is set
    pub rssi_base: i16,
    /// RSSI randomization threshold; 0 disables randomization
    pub rssi_threshold: i16,
    /// Use `rssi_base` +/- `rssi_threshold` instead of a path loss computation
    pub fake_rssi: bool,
    /// C/I base in centiBels
    pub ci_base: i16,
    /// C/I randomization threshold; 0 disables randomization
    pub ci_threshold: i16,
    /// Fixed path loss between any two transceivers, in dB
    pub path_loss: i16,
    /// Nominal transmit power in dBm, as reported by NOMTXPOWER
    pub tx_power_base: i16,
}

impl Default for CfgSim {
    fn default() -> Self {
        Self {
            toa256_base: 0,
            toa256_threshold: 0,
            rssi_base: -60,
            rssi_threshold: 0,
            fake_rssi: false,
            ci_base: 90,
            ci_threshold: 0,
            path_loss: 110,
            tx_power_base: 50,
        }
    }
}

#[derive(Default, Deserialize)]
pub struct CfgSimDto {
    pub toa256_base: Option<i16>,
    pub toa256_threshold: Option<i16>,
    pub rssi_base: Option<i16>,
    pub rssi_threshold: Option<i16>,
    pub fake_rssi: Option<bool>,
    pub ci_base: Option<i16>,
    pub ci_threshold: Option<i16>,
    pub path_loss: Option<i16>,
    pub tx_power_base: Option<i16>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Overlay the values present in a CfgSimDto (from TOML) onto the simulation defaults
pub fn apply_sim_patch(dst: &mut CfgSim, src: CfgSimDto) {
    if let Some(v) = src.toa256_base {
        dst.toa256_base = v;
    }
    if let Some(v) = src.toa256_threshold {
        dst.toa256_threshold = v;
    }
    if let Some(v) = src.rssi_base {
        dst.rssi_base = v;
    }
    if let Some(v) = src.rssi_threshold {
        dst.rssi_threshold = v;
    }
    if let Some(v) = src.fake_rssi {
        dst.fake_rssi = v;
    }
    if let Some(v) = src.ci_base {
        dst.ci_base = v;
    }
    if let Some(v) = src.ci_threshold {
        dst.ci_threshold = v;
    }
    if let Some(v) = src.path_loss {
        dst.path_loss = v;
    }
    if let Some(v) = src.tx_power_base {
        dst.tx_power_base = v;
    }
}
