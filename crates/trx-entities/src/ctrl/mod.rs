//! TRXC control command interpreter.
//!
//! Requests are `CMD <VERB> [args]`; every request gets `RSP <VERB> <status> [args] [values]`.
//! Simulation verbs (SETTA, FAKE_*) are tried first, then the common transceiver verbs.
//! Unknown verbs are acknowledged with status 0.

pub mod sim_cmds;
pub mod trx_cmds;

use trx_pdus::{CtrlCmd, CtrlRsp};

use crate::clock::{ClockError, ClockGen};
use crate::pwr_meas::PowerMeasurement;
use crate::trx::{Transceiver, TrxList};

/// Everything a command may need besides the addressed transceiver
#[derive(Clone, Copy)]
pub struct CtrlContext<'a> {
    pub trx_list: &'a TrxList,
    pub clck_gen: Option<&'a ClockGen>,
    pub pwr_meas: Option<&'a dyn PowerMeasurement>,
}

/// Status code and result values of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdOutcome {
    pub status: i32,
    pub values: Vec<String>,
}

impl CmdOutcome {
    pub fn ok() -> Self {
        Self::status(0)
    }

    pub fn err() -> Self {
        Self::status(-1)
    }

    pub fn status(status: i32) -> Self {
        Self { status, values: Vec::new() }
    }

    pub fn with_value(status: i32, value: impl ToString) -> Self {
        Self {
            status,
            values: vec![value.to_string()],
        }
    }
}

/// Returns the integer arguments if `cmd` has exactly `argc` of them, all well formed
pub(crate) fn int_args(cmd: &CtrlCmd, argc: usize) -> Option<Vec<i64>> {
    if cmd.args.len() != argc {
        return None;
    }
    cmd.int_args()
}

/// Interpret one control datagram for `trx`.
///
/// Returns the response to send, or None for datagrams that are not commands.
/// Only a failure to start the clock thread is reported as an error.
pub fn handle_request(ctx: &CtrlContext, trx: &Transceiver, data: &[u8]) -> Result<Option<CtrlRsp>, ClockError> {
    let cmd = match CtrlCmd::from_bytes(data) {
        Ok(cmd) => cmd,
        Err(e) => {
            tracing::warn!(trx = %trx, "Ignoring control message: {}", e);
            return Ok(None);
        }
    };
    tracing::debug!(trx = %trx, "Recv {}", cmd);

    let outcome = match sim_cmds::handle(trx, &cmd) {
        Some(outcome) => outcome,
        None => trx_cmds::handle(ctx, trx, &cmd)?,
    };
    Ok(Some(CtrlRsp::for_cmd(&cmd, outcome.status, &outcome.values)))
}
