//! Wire protocol PDUs exchanged between a GSM Layer-1 and a transceiver
//!
//! - TRXD: binary burst PDUs, header versions 0, 1 and 2 (batched)
//! - TRXC: text control commands, responses and clock indications

pub mod trxc;
pub mod trxd;

pub use trxc::{ClockInd, CtrlCmd, CtrlRsp};
pub use trxd::msgs::{RxMsg, TxMsg};
