use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use trx_core::GSM_FRAME_US;

use crate::stack_config_sim::CfgSim;
use crate::trx_def::TrxDef;

/// Remote (L1 side) ports are the local ones shifted by this amount
pub const REMOTE_PORT_OFFSET: u16 = 100;

pub const DEFAULT_BTS_BASE_PORT: u16 = 5700;
pub const DEFAULT_BB_BASE_PORT: u16 = 6700;

/// Clock generator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgClock {
    /// Send `IND CLOCK` every this many frames
    pub ind_period: u32,
    /// Frame number the counter starts from (and is reset to on stop)
    pub start_fn: u32,
    /// Subtracted from the GSM frame duration to compensate for loop-back latency
    pub compensation_us: u64,
}

impl Default for CfgClock {
    fn default() -> Self {
        Self {
            ind_period: 102,
            start_fn: 0,
            compensation_us: 0,
        }
    }
}

impl CfgClock {
    /// Tick interval: one TDMA frame minus the configured compensation
    pub fn interval(&self) -> Duration {
        Duration::from_micros(GSM_FRAME_US.saturating_sub(self.compensation_us))
    }
}

/// Fake power measurement configuration, all values in dBm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgPwrMeas {
    pub enabled: bool,
    pub noise_min: i16,
    pub noise_max: i16,
    pub trx_min: i16,
    pub trx_max: i16,
}

impl Default for CfgPwrMeas {
    fn default() -> Self {
        Self {
            enabled: true,
            noise_min: -120,
            noise_max: -105,
            trx_min: -75,
            trx_max: -50,
        }
    }
}

/// One simulated transceiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfgTrx {
    pub name: Option<String>,
    pub remote_addr: IpAddr,
    pub base_port: u16,
    /// 0 for a primary transceiver, N > 0 for the N-th child of the primary at the same address/port
    pub child_idx: u8,
    /// Whether a primary transceiver propagates POWERON/POWEROFF to its children
    pub child_mgt: bool,
    /// Append two padding octets to Rx v0 bursts, for L1 implementations that expect them
    pub legacy_padding: bool,
    pub sim: CfgSim,
}

impl CfgTrx {
    pub fn new(name: Option<&str>, remote_addr: IpAddr, base_port: u16, child_idx: u8) -> Self {
        Self {
            name: name.map(str::to_string),
            remote_addr,
            base_port,
            child_idx,
            child_mgt: true,
            legacy_padding: false,
            sim: CfgSim::default(),
        }
    }

    pub fn from_def(def: &TrxDef) -> Self {
        Self::new(None, def.remote_addr, def.base_port, def.child_idx)
    }

    /// Local clock port; only a primary transceiver has one
    pub fn clck_port(&self) -> Option<u16> {
        (self.child_idx == 0).then_some(self.base_port)
    }

    /// Local control port
    pub fn ctrl_port(&self) -> u16 {
        self.base_port + 1 + 2 * self.child_idx as u16
    }

    /// Local data port
    pub fn data_port(&self) -> u16 {
        self.base_port + 2 + 2 * self.child_idx as u16
    }

    /// Whether `other` is the primary transceiver this one is a child of
    pub fn is_child_of(&self, other: &CfgTrx) -> bool {
        self.child_idx > 0
            && other.child_idx == 0
            && self.remote_addr == other.remote_addr
            && self.base_port == other.base_port
    }

    fn local_ports(&self) -> Vec<u16> {
        let mut ports = vec![self.ctrl_port(), self.data_port()];
        ports.extend(self.clck_port());
        ports
    }
}

#[derive(Debug, Clone)]
pub struct StackConfig {
    pub debug_log: Option<String>,
    /// Local address all transceiver sockets bind to
    pub bind_addr: IpAddr,
    pub clock: CfgClock,
    pub pwr_meas: CfgPwrMeas,
    /// Transceivers in creation order; a child always follows its parent
    pub trx: Vec<CfgTrx>,
}

impl StackConfig {
    pub fn new(bind_addr: IpAddr) -> Self {
        StackConfig {
            debug_log: None,
            bind_addr,
            clock: CfgClock::default(),
            pwr_meas: CfgPwrMeas::default(),
            trx: Vec::new(),
        }
    }

    /// The classic setup: one transceiver facing a BTS and one facing an MS (baseband)
    pub fn with_bts_and_bb(bind_addr: IpAddr, bts: (IpAddr, u16), bb: (IpAddr, u16)) -> Self {
        let mut cfg = Self::new(bind_addr);
        cfg.trx.push(CfgTrx::new(Some("BTS"), bts.0, bts.1, 0));
        cfg.trx.push(CfgTrx::new(Some("MS"), bb.0, bb.1, 0));
        cfg
    }

    /// Add a transceiver from a command line definition. A child (N > 0) needs its parent to exist.
    pub fn add_trx_def(&mut self, def: &TrxDef) -> Result<(), String> {
        let trx = CfgTrx::from_def(def);
        if trx.child_idx > 0 && !self.trx.iter().any(|p| trx.is_child_of(p)) {
            return Err(format!("Couldn't find parent transceiver for '{}'", def));
        }
        self.trx.push(trx);
        Ok(())
    }

    /// Validate that all configuration fields are consistent.
    pub fn validate(&self) -> Result<(), String> {
        if self.clock.ind_period == 0 {
            return Err("clock ind_period must be greater than zero".to_string());
        }
        if self.clock.compensation_us >= GSM_FRAME_US {
            return Err(format!("clock compensation_us must be below {}", GSM_FRAME_US));
        }
        if self.pwr_meas.noise_min > self.pwr_meas.noise_max || self.pwr_meas.trx_min > self.pwr_meas.trx_max {
            return Err("pwr_meas ranges must have min <= max".to_string());
        }
        if self.trx.is_empty() {
            return Err("at least one transceiver must be configured".to_string());
        }

        let mut ports_in_use = HashSet::new();
        for (idx, trx) in self.trx.iter().enumerate() {
            let highest = trx.base_port as u32 + REMOTE_PORT_OFFSET as u32 + 2 + 2 * trx.child_idx as u32;
            if highest > u16::MAX as u32 {
                return Err(format!("transceiver {}:{} port range exceeds 65535", trx.remote_addr, trx.base_port));
            }
            if trx.child_idx > 0 && !self.trx[..idx].iter().any(|p| trx.is_child_of(p)) {
                return Err(format!(
                    "child transceiver {}:{}/{} must follow its parent",
                    trx.remote_addr, trx.base_port, trx.child_idx
                ));
            }
            for port in trx.local_ports() {
                if !ports_in_use.insert(port) {
                    return Err(format!("local port {} is used by more than one transceiver", port));
                }
            }
            let sim = &trx.sim;
            if sim.toa256_threshold < 0 || sim.rssi_threshold < 0 || sim.ci_threshold < 0 {
                return Err("simulation thresholds must not be negative".to_string());
            }
        }

        Ok(())
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        Self::with_bts_and_bb(
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            (localhost, DEFAULT_BTS_BASE_PORT),
            (localhost, DEFAULT_BB_BASE_PORT),
        )
    }
}

/// Global shared configuration, immutable after construction.
#[derive(Clone, Debug)]
pub struct SharedConfig {
    cfg: Arc<StackConfig>,
}

impl SharedConfig {
    /// Check config for validity before wrapping it
    pub fn from_config(cfg: StackConfig) -> Result<Self, String> {
        cfg.validate()?;
        Ok(Self { cfg: Arc::new(cfg) })
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<StackConfig> {
        Arc::clone(&self.cfg)
    }
}
