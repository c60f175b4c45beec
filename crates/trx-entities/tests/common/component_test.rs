use std::sync::Arc;
use std::time::Duration;

use trx_config::{SharedConfig, StackConfig};
use trx_core::modulation::GMSK_BURST_LEN;
use trx_entities::ctrl::{self, CtrlContext};
use trx_entities::fake_trx::clock_tick_handler;
use trx_entities::pwr_meas::{FakePowerMeter, PowerMeasurement};
use trx_entities::trx::TrxLinks;
use trx_entities::{BurstForwarder, ClockGen, DatagramLink, Transceiver, TrxId, TrxList};
use trx_pdus::{ClockInd, CtrlRsp, RxMsg, TxMsg};

use super::sink::SinkLink;

/// Long enough that the clock thread never ticks on its own during a test;
/// tests drive the clock with `ComponentTest::tick`
const IDLE_INTERVAL: Duration = Duration::from_secs(3600);

/// Creates a default config for testing: a BTS at 127.0.0.1:5700 and an MS at 127.0.0.1:6700.
/// It can still be modified as needed before passing it to the ComponentTest constructor
pub fn default_test_config() -> StackConfig {
    StackConfig::default()
}

/// Normal burst made of alternating hard-bits
pub fn gmsk_burst() -> Vec<u8> {
    (0..GMSK_BURST_LEN).map(|i| (i % 2) as u8).collect()
}

/// Sinks standing in for the L1 side of one transceiver
pub struct TrxSinks {
    pub data: Arc<SinkLink>,
    pub ctrl: Arc<SinkLink>,
    pub clck: Option<Arc<SinkLink>>,
}

/// Infrastructure for testing the transceiver simulation without sockets.
/// Every transceiver talks to sinks, and the clock is ticked by hand.
pub struct ComponentTest {
    pub config: SharedConfig,
    pub trx_list: Arc<TrxList>,
    pub clck_gen: Arc<ClockGen>,
    pub fwd: Arc<BurstForwarder>,
    pub pwr_meas: FakePowerMeter,
    pub sinks: Vec<TrxSinks>,
}

impl ComponentTest {
    pub fn new(config: StackConfig) -> Self {
        let config = SharedConfig::from_config(config).expect("invalid test config");
        let cfg = config.config();

        let mut trx = vec![];
        let mut sinks = vec![];
        for (idx, trx_cfg) in cfg.trx.iter().enumerate() {
            let s = TrxSinks {
                data: Arc::new(SinkLink::new(&format!("trx{}-data", idx))),
                ctrl: Arc::new(SinkLink::new(&format!("trx{}-ctrl", idx))),
                clck: trx_cfg
                    .clck_port()
                    .map(|_| Arc::new(SinkLink::new(&format!("trx{}-clck", idx)))),
            };
            let links = TrxLinks {
                data: s.data.clone(),
                ctrl: s.ctrl.clone(),
                clck: s.clck.clone().map(|c| c as Arc<dyn DatagramLink>),
            };
            trx.push(Transceiver::new(TrxId(idx), trx_cfg.clone(), links));
            sinks.push(s);
        }

        let trx_list = Arc::new(TrxList::new(trx));
        let clck_gen = Arc::new(ClockGen::with_interval(IDLE_INTERVAL, cfg.clock.ind_period, cfg.clock.start_fn));
        let fwd = Arc::new(BurstForwarder::new(trx_list.clone()));
        clck_gen.set_handler(clock_tick_handler(fwd.clone()));
        let pwr_meas = FakePowerMeter::new(&cfg.pwr_meas, trx_list.clone(), Some(clck_gen.clone()));

        Self {
            config,
            trx_list,
            clck_gen,
            fwd,
            pwr_meas,
            sinks,
        }
    }

    pub fn trx(&self, idx: usize) -> &Transceiver {
        self.trx_list.get(TrxId(idx)).expect("no such transceiver")
    }

    /// Handle a control command (without the `CMD ` prefix) for transceiver `idx`
    pub fn ctrl(&self, idx: usize, cmd: &str) -> CtrlRsp {
        let ctx = CtrlContext {
            trx_list: self.trx_list.as_ref(),
            clck_gen: Some(self.clck_gen.as_ref()),
            pwr_meas: Some(&self.pwr_meas as &dyn PowerMeasurement),
        };
        let request = format!("CMD {}\0", cmd);
        let rsp = ctrl::handle_request(&ctx, self.trx(idx), request.as_bytes())
            .expect("clock failure")
            .expect("no response");
        tracing::debug!("{} -> {}", cmd, rsp);
        rsp
    }

    /// Tune, activate timeslots and power on transceiver `idx`
    pub fn power_on(&self, idx: usize, rx_khz: u32, tx_khz: u32, slots: &[u8]) {
        assert_eq!(self.ctrl(idx, &format!("RXTUNE {}", rx_khz)).status, 0);
        assert_eq!(self.ctrl(idx, &format!("TXTUNE {}", tx_khz)).status, 0);
        for tn in slots {
            assert_eq!(self.ctrl(idx, &format!("SETSLOT {} 1", tn)).status, 0);
        }
        assert_eq!(self.ctrl(idx, "POWERON").status, 0);
    }

    /// Classic pair: BTS transmits on 925 MHz and receives on 880 MHz, the MS the other way round
    pub fn power_on_pair(&self, slots: &[u8]) {
        self.power_on(0, 880_000, 925_000, slots);
        self.power_on(1, 925_000, 880_000, slots);
    }

    /// Deliver TRXD bursts from the L1 of transceiver `idx`, one datagram each
    pub fn send_tx(&self, idx: usize, msgs: &[TxMsg]) -> usize {
        msgs.iter()
            .map(|msg| self.trx(idx).recv_data_msg(&msg.to_bytes().expect("invalid TxMsg")))
            .sum()
    }

    /// Advance the clock by one frame, returning the new frame number
    pub fn tick(&self) -> u32 {
        self.clck_gen.tick_now();
        self.clck_gen.current_fn()
    }

    pub fn tick_until(&self, fn_num: u32) {
        while self.clck_gen.current_fn() != fn_num {
            self.tick();
        }
    }

    /// Bursts received by the L1 of transceiver `idx` since the last call
    pub fn take_rx(&self, idx: usize) -> Vec<RxMsg> {
        self.sinks[idx]
            .data
            .take_sent()
            .iter()
            .map(|pdu| RxMsg::from_bytes(pdu).expect("invalid RxMsg"))
            .collect()
    }

    /// Clock indications sent to the L1 of transceiver `idx` since the last call
    pub fn take_clck(&self, idx: usize) -> Vec<u32> {
        let Some(clck) = &self.sinks[idx].clck else {
            return vec![];
        };
        clck.take_sent()
            .iter()
            .map(|pdu| ClockInd::from_bytes(pdu).expect("invalid IND CLOCK").fn_num)
            .collect()
    }
}
