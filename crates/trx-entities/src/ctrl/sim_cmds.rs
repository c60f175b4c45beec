use trx_pdus::CtrlCmd;

use super::{CmdOutcome, int_args};
use crate::trx::Transceiver;
use crate::trx::rf_sim::{SimParams, TA_MAX};

#[derive(Debug, Clone, Copy)]
enum FakeParam {
    Toa256,
    Rssi,
    Ci,
}

impl FakeParam {
    fn base_and_threshold(self, sim: &mut SimParams) -> (&mut i32, &mut i32) {
        match self {
            FakeParam::Toa256 => (&mut sim.toa256_base, &mut sim.toa256_threshold),
            FakeParam::Rssi => (&mut sim.rssi_base, &mut sim.rssi_threshold),
            FakeParam::Ci => (&mut sim.ci_base, &mut sim.ci_threshold),
        }
    }
}

/// Handles the RF simulation verbs. None if `cmd` is not one of them.
pub fn handle(trx: &Transceiver, cmd: &CtrlCmd) -> Option<CmdOutcome> {
    let outcome = match cmd.verb.as_str() {
        "SETTA" => setta(trx, cmd),
        "FAKE_TOA" => fake_param(trx, cmd, FakeParam::Toa256),
        "FAKE_RSSI" => {
            let outcome = fake_param(trx, cmd, FakeParam::Rssi);
            if outcome.status == 0 {
                trx.state_mut().sim.fake_rssi = true;
            }
            outcome
        }
        "FAKE_CI" => fake_param(trx, cmd, FakeParam::Ci),
        "FAKE_DROP" => fake_drop(trx, cmd),
        _ => return None,
    };
    Some(outcome)
}

fn setta(trx: &Transceiver, cmd: &CtrlCmd) -> CmdOutcome {
    let Some(args) = int_args(cmd, 1) else {
        return CmdOutcome::err();
    };
    if !(0..=TA_MAX as i64).contains(&args[0]) {
        tracing::error!(trx = %trx, "TA value {} out of range 0..{}", args[0], TA_MAX);
        return CmdOutcome::err();
    }
    trx.state_mut().sim.ta = args[0] as u8;
    CmdOutcome::ok()
}

/// `<VERB> base threshold` sets both, `<VERB> delta` shifts the base.
/// Base and threshold must fit the 16-bit measurement fields.
fn fake_param(trx: &Transceiver, cmd: &CtrlCmd, param: FakeParam) -> CmdOutcome {
    let Some(args) = cmd.int_args() else {
        return CmdOutcome::err();
    };
    let in_range = |v: i64| (i16::MIN as i64..=i16::MAX as i64).contains(&v);

    let mut state = trx.state_mut();
    let (base, threshold) = param.base_and_threshold(&mut state.sim);
    let (new_base, new_threshold) = match args[..] {
        [b, t] => (b, t),
        [delta] => ((*base as i64).saturating_add(delta), *threshold as i64),
        _ => return CmdOutcome::err(),
    };
    if !in_range(new_base) || !in_range(new_threshold) || new_threshold < 0 {
        tracing::error!(trx = %trx, "{} values out of range: base {}, threshold {}", cmd.verb, new_base, new_threshold);
        return CmdOutcome::err();
    }
    *base = new_base as i32;
    *threshold = new_threshold as i32;
    CmdOutcome::ok()
}

/// `FAKE_DROP amount [period]`
fn fake_drop(trx: &Transceiver, cmd: &CtrlCmd) -> CmdOutcome {
    let Some(args) = cmd.int_args() else {
        return CmdOutcome::err();
    };
    let (amount, period) = match args[..] {
        [amount] => (amount, 1),
        [amount, period] => (amount, period),
        _ => return CmdOutcome::err(),
    };

    let Ok(amount) = u32::try_from(amount) else {
        tracing::error!(trx = %trx, "FAKE_DROP amount {} out of range", amount);
        return CmdOutcome::err();
    };
    let Ok(period) = u32::try_from(period) else {
        tracing::error!(trx = %trx, "FAKE_DROP period shall be greater than zero");
        return CmdOutcome::err();
    };
    if period == 0 {
        tracing::error!(trx = %trx, "FAKE_DROP period shall be greater than zero");
        return CmdOutcome::err();
    }

    let mut state = trx.state_mut();
    state.sim.drop_amount = amount;
    state.sim.drop_period = period;
    CmdOutcome::ok()
}
