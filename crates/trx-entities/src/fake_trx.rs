use std::net::SocketAddr;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};

use trx_config::{REMOTE_PORT_OFFSET, SharedConfig};

use crate::clock::{ClockError, ClockGen};
use crate::ctrl::{self, CtrlContext};
use crate::fwd::BurstForwarder;
use crate::network::{DatagramLink, Event, LinkId, LinkKind, NetworkError, ReaderPool, UdpLink};
use crate::pwr_meas::{FakePowerMeter, PowerMeasurement};
use crate::trx::{Transceiver, TrxId, TrxLinks, TrxList};

#[derive(Debug)]
pub enum FakeTrxError {
    Network(NetworkError),
    Clock(ClockError),
}

impl std::fmt::Display for FakeTrxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FakeTrxError::Network(e) => write!(f, "{}", e),
            FakeTrxError::Clock(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for FakeTrxError {}

impl From<NetworkError> for FakeTrxError {
    fn from(e: NetworkError) -> Self {
        FakeTrxError::Network(e)
    }
}

impl From<ClockError> for FakeTrxError {
    fn from(e: ClockError) -> Self {
        FakeTrxError::Clock(e)
    }
}

/// The virtual Um-interface: all configured transceivers, one shared clock, the
/// burst forwarder and the fake power meter, driven by a single event loop
pub struct FakeTrx {
    trx_list: Arc<TrxList>,
    clck_gen: Arc<ClockGen>,
    fwd: Arc<BurstForwarder>,
    pwr_meas: Option<FakePowerMeter>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    readers: ReaderPool,
}

impl FakeTrx {
    /// Bind all sockets and wire the components together. Nothing runs until `run`.
    pub fn new(cfg: SharedConfig) -> Result<Self, FakeTrxError> {
        let config = cfg.config();
        let clck_gen = Arc::new(ClockGen::new(&config.clock));
        let (events_tx, events_rx) = unbounded();
        let mut readers = ReaderPool::new();

        let mut trx = Vec::with_capacity(config.trx.len());
        for (idx, trx_cfg) in config.trx.iter().enumerate() {
            let id = TrxId(idx);
            let bind = |port: u16| {
                UdpLink::bind(
                    SocketAddr::new(config.bind_addr, port),
                    SocketAddr::new(trx_cfg.remote_addr, port + REMOTE_PORT_OFFSET),
                )
            };

            let data = bind(trx_cfg.data_port())?;
            let ctrl = bind(trx_cfg.ctrl_port())?;
            readers.spawn(data.try_clone_socket()?, LinkId { trx: id, kind: LinkKind::Data }, events_tx.clone())?;
            readers.spawn(ctrl.try_clone_socket()?, LinkId { trx: id, kind: LinkKind::Ctrl }, events_tx.clone())?;
            let clck: Option<Arc<dyn DatagramLink>> = match trx_cfg.clck_port() {
                Some(port) => Some(Arc::new(bind(port)?)),
                None => None,
            };

            let links = TrxLinks {
                data: Arc::new(data),
                ctrl: Arc::new(ctrl),
                clck,
            };
            trx.push(Transceiver::new(id, trx_cfg.clone(), links));
        }

        let trx_list = Arc::new(TrxList::new(trx));
        let fwd = Arc::new(BurstForwarder::new(Arc::clone(&trx_list)));
        clck_gen.set_handler(clock_tick_handler(Arc::clone(&fwd)));

        let pwr_meas = config
            .pwr_meas
            .enabled
            .then(|| FakePowerMeter::new(&config.pwr_meas, Arc::clone(&trx_list), Some(Arc::clone(&clck_gen))));

        Ok(Self {
            trx_list,
            clck_gen,
            fwd,
            pwr_meas,
            events_tx,
            events_rx,
            readers,
        })
    }

    /// Sender for injecting events, e.g. `Event::Shutdown` from a signal handler
    pub fn event_sender(&self) -> Sender<Event> {
        self.events_tx.clone()
    }

    pub fn trx_list(&self) -> &Arc<TrxList> {
        &self.trx_list
    }

    pub fn clck_gen(&self) -> &Arc<ClockGen> {
        &self.clck_gen
    }

    pub fn forwarder(&self) -> &Arc<BurstForwarder> {
        &self.fwd
    }

    pub fn ctrl_context(&self) -> CtrlContext<'_> {
        CtrlContext {
            trx_list: &self.trx_list,
            clck_gen: Some(self.clck_gen.as_ref()),
            pwr_meas: self.pwr_meas.as_ref().map(|pm| pm as &dyn PowerMeasurement),
        }
    }

    /// Process one event. Returns false once the loop should end.
    pub fn handle_event(&self, event: Event) -> Result<bool, ClockError> {
        let (link, data) = match event {
            Event::Shutdown => return Ok(false),
            Event::Datagram { link, data } => (link, data),
        };
        let Some(trx) = self.trx_list.get(link.trx) else {
            tracing::warn!("Datagram for unknown transceiver {:?}", link.trx);
            return Ok(true);
        };

        match link.kind {
            LinkKind::Data => {
                trx.recv_data_msg(&data);
            }
            LinkKind::Ctrl => {
                if let Some(rsp) = ctrl::handle_request(&self.ctrl_context(), trx, &data)? {
                    trx.send_ctrl_rsp(&rsp);
                }
            }
        }
        Ok(true)
    }

    /// Run the event loop until a shutdown event, then stop the clock and the readers
    pub fn run(&mut self) -> Result<(), FakeTrxError> {
        tracing::info!("Init complete, {} transceiver(s)", self.trx_list.len());
        let result = self.event_loop();
        self.shutdown();
        result
    }

    fn event_loop(&self) -> Result<(), FakeTrxError> {
        while let Ok(event) = self.events_rx.recv() {
            if !self.handle_event(event)? {
                break;
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        tracing::info!("Shutting down...");
        self.clck_gen.stop();
        self.readers.stop_and_join();
    }
}

/// On every clock tick, release each transceiver's due bursts to the forwarder
pub fn clock_tick_handler(fwd: Arc<BurstForwarder>) -> crate::clock::TickHandler {
    Arc::new(move |fn_num| {
        for trx in fwd.trx_list().iter() {
            trx.clck_tick(&fwd, fn_num);
        }
    })
}
