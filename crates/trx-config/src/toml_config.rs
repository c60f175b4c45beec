use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::net::IpAddr;
use std::path::Path;

use serde::Deserialize;
use toml::Value;

use super::stack_config::{CfgClock, CfgPwrMeas, CfgTrx, SharedConfig, StackConfig};
use super::stack_config_sim::{CfgSimDto, apply_sim_patch};

const EXPECTED_CONFIG_VERSION: &str = "0.1";

/// Build a not yet validated `StackConfig` from a TOML string, so that callers
/// can still amend it (e.g. with command line transceivers) before sharing it
pub fn stack_config_from_toml_str(toml_str: &str) -> Result<StackConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    // Various sanity checks
    if !root.config_version.eq(EXPECTED_CONFIG_VERSION) {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, EXPECTED_CONFIG_VERSION
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }
    if let Some(ref clock) = root.clock {
        if !clock.extra.is_empty() {
            return Err(format!("Unrecognized fields in clock: {:?}", sorted_keys(&clock.extra)).into());
        }
    }
    if let Some(ref pm) = root.pwr_meas {
        if !pm.extra.is_empty() {
            return Err(format!("Unrecognized fields in pwr_meas: {:?}", sorted_keys(&pm.extra)).into());
        }
    }
    for trx in &root.trx {
        if !trx.extra.is_empty() {
            return Err(format!("Unrecognized fields in trx: {:?}", sorted_keys(&trx.extra)).into());
        }
        if let Some(ref sim) = trx.sim {
            if !sim.extra.is_empty() {
                return Err(format!("Unrecognized fields in trx.sim: {:?}", sorted_keys(&sim.extra)).into());
            }
        }
    }

    // Without any [[trx]] table, fall back to the BTS + MS pair
    let mut cfg = if root.trx.is_empty() {
        StackConfig::default()
    } else {
        StackConfig::new(StackConfig::default().bind_addr)
    };
    cfg.debug_log = root.debug_log;
    if let Some(addr) = root.trx_bind_addr {
        cfg.bind_addr = addr;
    }
    if let Some(clock) = root.clock {
        apply_clock_patch(&mut cfg.clock, clock);
    }
    if let Some(pm) = root.pwr_meas {
        apply_pwr_meas_patch(&mut cfg.pwr_meas, pm);
    }
    for trx in root.trx {
        cfg.trx.push(apply_trx_patch(trx));
    }

    Ok(cfg)
}

/// Build `SharedConfig` from a TOML configuration string
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let cfg = stack_config_from_toml_str(toml_str)?;
    Ok(SharedConfig::from_config(cfg)?)
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    let r = BufReader::new(f);
    let cfg = from_reader(r)?;
    Ok(cfg)
}

/// Read a file into a `StackConfig` without validating it yet.
pub fn stack_config_from_file<P: AsRef<Path>>(path: P) -> Result<StackConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    BufReader::new(File::open(path)?).read_to_string(&mut contents)?;
    stack_config_from_toml_str(&contents)
}

fn apply_clock_patch(dst: &mut CfgClock, src: ClockDto) {
    if let Some(v) = src.ind_period {
        dst.ind_period = v;
    }
    if let Some(v) = src.start_fn {
        dst.start_fn = v;
    }
    if let Some(v) = src.compensation_us {
        dst.compensation_us = v;
    }
}

fn apply_pwr_meas_patch(dst: &mut CfgPwrMeas, src: PwrMeasDto) {
    if let Some(v) = src.enabled {
        dst.enabled = v;
    }
    if let Some([min, max]) = src.noise_range {
        dst.noise_min = min;
        dst.noise_max = max;
    }
    if let Some([min, max]) = src.trx_range {
        dst.trx_min = min;
        dst.trx_max = max;
    }
}

fn apply_trx_patch(src: TrxDto) -> CfgTrx {
    let mut dst = CfgTrx::new(src.name.as_deref(), src.remote_addr, src.base_port, src.child_idx);
    if let Some(v) = src.child_mgt {
        dst.child_mgt = v;
    }
    if let Some(v) = src.legacy_padding {
        dst.legacy_padding = v;
    }
    if let Some(sim) = src.sim {
        apply_sim_patch(&mut dst.sim, sim);
    }
    dst
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut v: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    v.sort_unstable();
    v
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,
    trx_bind_addr: Option<IpAddr>,

    #[serde(default)]
    clock: Option<ClockDto>,

    #[serde(default)]
    pwr_meas: Option<PwrMeasDto>,

    #[serde(default)]
    trx: Vec<TrxDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct ClockDto {
    pub ind_period: Option<u32>,
    pub start_fn: Option<u32>,
    pub compensation_us: Option<u64>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct PwrMeasDto {
    pub enabled: Option<bool>,
    /// [min, max] in dBm
    pub noise_range: Option<[i16; 2]>,
    /// [min, max] in dBm
    pub trx_range: Option<[i16; 2]>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct TrxDto {
    pub name: Option<String>,
    pub remote_addr: IpAddr,
    pub base_port: u16,
    #[serde(default)]
    pub child_idx: u8,
    pub child_mgt: Option<bool>,
    pub legacy_padding: Option<bool>,

    #[serde(default)]
    pub sim: Option<CfgSimDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}
