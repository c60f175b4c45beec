use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};

use trx_config::CfgClock;
use trx_core::GSM_HYPERFRAME;
use trx_pdus::ClockInd;

use crate::network::DatagramLink;

/// Called on every tick with the new frame number, from the clock thread
pub type TickHandler = Arc<dyn Fn(u32) + Send + Sync>;

#[derive(Debug)]
pub enum ClockError {
    AlreadyRunning,
    SpawnFailed(String),
}

impl std::fmt::Display for ClockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockError::AlreadyRunning => write!(f, "clock generator is already running"),
            ClockError::SpawnFailed(msg) => write!(f, "failed to spawn clock thread: {}", msg),
        }
    }
}

impl std::error::Error for ClockError {}

/// State shared with the worker thread
struct ClockShared {
    fn_num: AtomicU32,
    start_fn: u32,
    ind_period: u32,
    /// Subscribers, keyed by an owner-chosen id
    links: Mutex<Vec<(usize, Arc<dyn DatagramLink>)>>,
    handler: Mutex<Option<TickHandler>>,
}

impl ClockShared {
    fn tick(&self) {
        let fn_num = (self.fn_num.load(Ordering::SeqCst) + 1) % GSM_HYPERFRAME;
        self.fn_num.store(fn_num, Ordering::SeqCst);

        if fn_num % self.ind_period == 0 {
            let ind = ClockInd { fn_num }.to_bytes();
            let links = self.links.lock().unwrap_or_else(PoisonError::into_inner).clone();
            for (_, link) in &links {
                if let Err(e) = link.send(&ind) {
                    tracing::warn!("IND CLOCK {} to {}: {}", fn_num, link.describe(), e);
                }
            }
            tracing::trace!("IND CLOCK {} sent to {} link(s)", fn_num, links.len());
        }

        let handler = self.handler.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(handler) = handler {
            handler(fn_num);
        }
    }
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// The schedule anchor moves forward after this many ticks, keeping `n` small
const REANCHOR_TICKS: u32 = 1 << 16;

/// Tick deadlines at `t0 + n * interval`
struct TickSchedule {
    t0: Instant,
    n: u32,
    interval: Duration,
}

impl TickSchedule {
    fn new(t0: Instant, interval: Duration) -> Self {
        Self { t0, n: 0, interval }
    }

    fn next_deadline(&mut self) -> Instant {
        if self.n >= REANCHOR_TICKS {
            self.t0 += self.interval * self.n;
            self.n = 0;
        }
        self.n += 1;
        self.t0 + self.interval * self.n
    }

    fn resync(&mut self, now: Instant) {
        self.t0 = now;
        self.n = 0;
    }
}

/// TDMA frame clock: Stopped -> Running -> Stopped.
///
/// Ticks are scheduled at `t0 + n * interval`, so time spent in the tick itself
/// never accumulates into drift.
pub struct ClockGen {
    interval: Duration,
    shared: Arc<ClockShared>,
    worker: Mutex<Option<Worker>>,
}

impl ClockGen {
    pub fn new(cfg: &CfgClock) -> Self {
        Self::with_interval(cfg.interval(), cfg.ind_period, cfg.start_fn)
    }

    pub fn with_interval(interval: Duration, ind_period: u32, start_fn: u32) -> Self {
        assert!(ind_period > 0, "ind_period must be greater than zero");
        Self {
            interval,
            shared: Arc::new(ClockShared {
                fn_num: AtomicU32::new(start_fn % GSM_HYPERFRAME),
                start_fn: start_fn % GSM_HYPERFRAME,
                ind_period,
                links: Mutex::new(Vec::new()),
                handler: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_handler(&self, handler: TickHandler) {
        *self.shared.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    /// Frame number of the most recent tick (or the start value)
    pub fn current_fn(&self) -> u32 {
        self.shared.fn_num.load(Ordering::SeqCst)
    }

    pub fn add_link(&self, id: usize, link: Arc<dyn DatagramLink>) {
        let mut links = self.shared.links.lock().unwrap_or_else(PoisonError::into_inner);
        if !links.iter().any(|(i, _)| *i == id) {
            links.push((id, link));
        }
    }

    pub fn remove_link(&self, id: usize) {
        self.shared
            .links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(i, _)| *i != id);
    }

    pub fn has_link(&self, id: usize) -> bool {
        self.shared
            .links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(i, _)| *i == id)
    }

    pub fn num_links(&self) -> usize {
        self.shared.links.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn start(&self) -> Result<(), ClockError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return Err(ClockError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let shared = Arc::clone(&self.shared);
        let interval = self.interval;
        let handle = thread::Builder::new()
            .name("clck-gen".to_string())
            .spawn(move || {
                let mut schedule = TickSchedule::new(Instant::now(), interval);
                loop {
                    let deadline = schedule.next_deadline();
                    match stop_rx.recv_deadline(deadline) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let now = Instant::now();
                    if now > deadline + interval {
                        tracing::warn!(
                            "clock fell behind by {:?}, resynchronizing",
                            now.duration_since(deadline)
                        );
                        schedule.resync(now);
                    }
                    shared.tick();
                }
            })
            .map_err(|e| {
                tracing::error!("Failed to spawn clock thread: {}", e);
                ClockError::SpawnFailed(e.to_string())
            })?;

        tracing::info!("Starting clock generator (interval {:?})", self.interval);
        *worker = Some(Worker { stop: stop_tx, handle });
        Ok(())
    }

    /// Stop the worker, wait for it, and reset the frame counter. A no-op when stopped.
    pub fn stop(&self) {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(worker) = worker else {
            return;
        };

        tracing::info!("Stopping clock generator");
        // Disconnecting the channel wakes the thread
        drop(worker.stop);
        if worker.handle.join().is_err() {
            tracing::error!("clock thread panicked");
        }
        self.shared.fn_num.store(self.shared.start_fn, Ordering::SeqCst);
    }

    /// Run a single tick on the calling thread, as the worker would
    pub fn tick_now(&self) {
        self.shared.tick();
    }
}

impl Drop for ClockGen {
    fn drop(&mut self) {
        self.stop();
    }
}
