//! Simulated GSM transceivers connected over UDP to real Layer-1 peers
//!
//! - `network`: UDP links and the reader threads feeding the event loop
//! - `clock`: the TDMA frame clock generator
//! - `trx`: transceivers, their transmit queues and RF impairment simulation
//! - `fwd`: burst forwarding between transceivers
//! - `ctrl`: the TRXC control command interpreter
//! - `pwr_meas`: power measurement for the MEASURE command

pub mod clock;
pub mod ctrl;
pub mod fake_trx;
pub mod fwd;
pub mod network;
pub mod pwr_meas;
pub mod trx;

pub use clock::ClockGen;
pub use fake_trx::{FakeTrx, FakeTrxError};
pub use fwd::BurstForwarder;
pub use network::{DatagramLink, Event};
pub use trx::{Transceiver, TrxId, TrxList};
