use trx_core::{FreqHz, HoppingParams, NUM_TIMESLOTS};
use trx_pdus::CtrlCmd;
use trx_pdus::trxd::best_supported;
use trx_pdus::trxd::layouts::VERSION_FIELD_MAX;

use super::{CmdOutcome, CtrlContext, int_args};
use crate::clock::ClockError;
use crate::trx::Transceiver;

/// Handles the verbs common to every transceiver
pub fn handle(ctx: &CtrlContext, trx: &Transceiver, cmd: &CtrlCmd) -> Result<CmdOutcome, ClockError> {
    let outcome = match cmd.verb.as_str() {
        "POWERON" => return poweron(ctx, trx, cmd),
        "POWEROFF" => return poweroff(ctx, trx, cmd),
        "RXTUNE" => tune(trx, cmd, true),
        "TXTUNE" => tune(trx, cmd, false),
        "SETSLOT" => setslot(trx, cmd),
        "SETFH" => setfh(trx, cmd),
        "SETFORMAT" => setformat(trx, cmd),
        "MEASURE" => measure(ctx, trx, cmd),
        "SETPOWER" => setpower(trx, cmd),
        "NOMTXPOWER" => match int_args(cmd, 0) {
            Some(_) => CmdOutcome::with_value(0, trx.state().tx_power_base),
            None => CmdOutcome::err(),
        },
        "RFMUTE" => match int_args(cmd, 1) {
            Some(args) => {
                trx.state_mut().rf_muted = args[0] > 0;
                CmdOutcome::ok()
            }
            None => CmdOutcome::err(),
        },
        _ => {
            tracing::debug!(trx = %trx, "Ignore CMD {}", cmd.verb);
            CmdOutcome::ok()
        }
    };
    Ok(outcome)
}

fn poweron(ctx: &CtrlContext, trx: &Transceiver, cmd: &CtrlCmd) -> Result<CmdOutcome, ClockError> {
    if int_args(cmd, 0).is_none() {
        return Ok(CmdOutcome::err());
    }
    {
        let state = trx.state();
        if state.running {
            tracing::error!(trx = %trx, "Transceiver already started");
            return Ok(CmdOutcome::err());
        }
        if !state.ready() {
            tracing::error!(trx = %trx, "Transceiver is not ready");
            return Ok(CmdOutcome::err());
        }
    }

    tracing::info!(trx = %trx, "Starting transceiver...");
    ctx.trx_list.power_event(trx.id(), true, ctx.clck_gen)?;
    Ok(CmdOutcome::ok())
}

fn poweroff(ctx: &CtrlContext, trx: &Transceiver, cmd: &CtrlCmd) -> Result<CmdOutcome, ClockError> {
    if int_args(cmd, 0).is_none() {
        return Ok(CmdOutcome::err());
    }
    tracing::info!(trx = %trx, "Stopping transceiver...");
    ctx.trx_list.power_event(trx.id(), false, ctx.clck_gen)?;
    Ok(CmdOutcome::ok())
}

fn khz_to_hz(khz: i64) -> Option<FreqHz> {
    khz.checked_mul(1000).and_then(|hz| FreqHz::try_from(hz).ok())
}

fn tune(trx: &Transceiver, cmd: &CtrlCmd, rx: bool) -> CmdOutcome {
    let Some(freq) = int_args(cmd, 1).and_then(|args| khz_to_hz(args[0])) else {
        return CmdOutcome::err();
    };
    let mut state = trx.state_mut();
    if rx {
        state.rx_freq = Some(freq);
    } else {
        state.tx_freq = Some(freq);
    }
    CmdOutcome::ok()
}

/// `SETSLOT tn type`: type 0 deactivates the slot, anything else activates it
fn setslot(trx: &Transceiver, cmd: &CtrlCmd) -> CmdOutcome {
    let Some(args) = int_args(cmd, 2) else {
        return CmdOutcome::err();
    };
    if !(0..NUM_TIMESLOTS as i64).contains(&args[0]) {
        tracing::error!(trx = %trx, "TS index should be in range: 0..7");
        return CmdOutcome::err();
    }
    trx.state_mut().set_slot(args[0] as u8, args[1] != 0);
    CmdOutcome::ok()
}

/// `SETFH hsn maio rx1 tx1 [rx2 tx2 ...]`, frequencies in kHz
fn setfh(trx: &Transceiver, cmd: &CtrlCmd) -> CmdOutcome {
    let Some(args) = cmd.int_args() else {
        return CmdOutcome::err();
    };
    if args.len() < 4 || args.len() % 2 != 0 {
        tracing::error!(trx = %trx, "SETFH expects HSN, MAIO and (Rx, Tx) frequency pairs");
        return CmdOutcome::err();
    }

    let (Ok(hsn), Ok(maio)) = (u8::try_from(args[0]), u8::try_from(args[1])) else {
        return CmdOutcome::err();
    };
    let ma: Option<Vec<(FreqHz, FreqHz)>> = args[2..]
        .chunks_exact(2)
        .map(|pair| Some((khz_to_hz(pair[0])?, khz_to_hz(pair[1])?)))
        .collect();
    let Some(ma) = ma else {
        return CmdOutcome::err();
    };

    match HoppingParams::new(hsn, maio, ma) {
        Ok(fh) => {
            tracing::info!(trx = %trx, "Frequency hopping enabled: {}", fh);
            trx.state_mut().fh = Some(fh);
            CmdOutcome::ok()
        }
        Err(e) => {
            tracing::error!(trx = %trx, "Failed to configure frequency hopping: {}", e);
            CmdOutcome::err()
        }
    }
}

/// Header version negotiation: adopt a supported version, otherwise suggest the best lower one
fn setformat(trx: &Transceiver, cmd: &CtrlCmd) -> CmdOutcome {
    let Some(args) = int_args(cmd, 1) else {
        return CmdOutcome::err();
    };
    let Some(ver_req) = u8::try_from(args[0]).ok().filter(|&v| v <= VERSION_FIELD_MAX) else {
        tracing::error!(trx = %trx, "Incorrect TRXD header version {}", args[0]);
        return CmdOutcome::err();
    };
    let Some(ver_rsp) = best_supported(ver_req) else {
        return CmdOutcome::err();
    };

    if ver_rsp != ver_req {
        tracing::warn!(
            trx = %trx,
            "Requested TRXD header version {} is not supported, suggesting {}...",
            ver_req,
            ver_rsp
        );
        return CmdOutcome::status(ver_rsp as i32);
    }

    let mut state = trx.state_mut();
    tracing::info!(trx = %trx, "TRXD header version {} -> {}", state.hdr_ver, ver_req);
    state.hdr_ver = ver_req;
    CmdOutcome::status(ver_req as i32)
}

fn measure(ctx: &CtrlContext, trx: &Transceiver, cmd: &CtrlCmd) -> CmdOutcome {
    let Some(freq) = int_args(cmd, 1).and_then(|args| khz_to_hz(args[0])) else {
        return CmdOutcome::err();
    };
    let Some(pwr_meas) = ctx.pwr_meas else {
        tracing::error!(trx = %trx, "Power Measurement interface is not initialized => rejecting command");
        return CmdOutcome::err();
    };
    CmdOutcome::with_value(0, pwr_meas.measure(freq))
}

/// `SETPOWER att`, attenuation in dB, 0..255
fn setpower(trx: &Transceiver, cmd: &CtrlCmd) -> CmdOutcome {
    let Some(att) = int_args(cmd, 1).and_then(|args| u8::try_from(args[0]).ok()) else {
        tracing::error!(trx = %trx, "SETPOWER attenuation must be in range 0..255");
        return CmdOutcome::err();
    };
    trx.state_mut().tx_att_base = att as i32;
    CmdOutcome::ok()
}
