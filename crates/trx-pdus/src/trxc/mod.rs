//! TRXC text PDUs: `CMD <VERB> [args]`, `RSP <VERB> <status> [args]` and `IND CLOCK <fn>`.
//! Every PDU is terminated by a NUL octet on the wire; parsing tolerates its absence.

use core::fmt;
use std::str::FromStr;

use trx_core::PduParseErr;

/// Strips the NUL terminator and surrounding whitespace, returning the ASCII text
fn pdu_text(data: &[u8]) -> Result<&str, PduParseErr> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let text = std::str::from_utf8(&data[..end])
        .map_err(|_| PduParseErr::Inconsistency { field: "trxc", reason: "not ASCII text" })?;
    Ok(text.trim())
}

fn to_wire(text: String) -> Vec<u8> {
    let mut bytes = text.into_bytes();
    bytes.push(0);
    bytes
}

/// Control command, L1 -> TRX
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtrlCmd {
    pub verb: String,
    pub args: Vec<String>,
}

impl CtrlCmd {
    pub fn new(verb: &str, args: &[&str]) -> Self {
        Self {
            verb: verb.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, PduParseErr> {
        let text = pdu_text(data)?;
        let mut tokens = text.split_whitespace();
        if tokens.next() != Some("CMD") {
            return Err(PduParseErr::Inconsistency { field: "trxc", reason: "not a CMD message" });
        }
        let verb = tokens
            .next()
            .ok_or(PduParseErr::BufferEnded { field: Some("verb") })?
            .to_string();
        let args = tokens.map(str::to_string).collect();
        Ok(Self { verb, args })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        to_wire(self.to_string())
    }

    /// Parses argument `idx` as an integer, None if missing or malformed
    pub fn arg<T: FromStr>(&self, idx: usize) -> Option<T> {
        self.args.get(idx).and_then(|a| a.parse().ok())
    }

    /// Parses all arguments as integers, None if any is malformed
    pub fn int_args(&self) -> Option<Vec<i64>> {
        self.args.iter().map(|a| a.parse().ok()).collect()
    }
}

impl fmt::Display for CtrlCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CMD {}", self.verb)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Control response, TRX -> L1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtrlRsp {
    pub verb: String,
    pub status: i32,
    /// Request arguments echoed back, followed by any result values
    pub args: Vec<String>,
}

impl CtrlRsp {
    /// Builds the response to `cmd`, echoing its arguments and appending `values`
    pub fn for_cmd(cmd: &CtrlCmd, status: i32, values: &[String]) -> Self {
        let mut args = cmd.args.clone();
        args.extend_from_slice(values);
        Self { verb: cmd.verb.clone(), status, args }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, PduParseErr> {
        let text = pdu_text(data)?;
        let mut tokens = text.split_whitespace();
        if tokens.next() != Some("RSP") {
            return Err(PduParseErr::Inconsistency { field: "trxc", reason: "not a RSP message" });
        }
        let verb = tokens
            .next()
            .ok_or(PduParseErr::BufferEnded { field: Some("verb") })?
            .to_string();
        let status = tokens
            .next()
            .ok_or(PduParseErr::BufferEnded { field: Some("status") })?
            .parse()
            .map_err(|_| PduParseErr::Inconsistency { field: "status", reason: "not an integer" })?;
        let args = tokens.map(str::to_string).collect();
        Ok(Self { verb, status, args })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        to_wire(self.to_string())
    }
}

impl fmt::Display for CtrlRsp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RSP {} {}", self.verb, self.status)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Clock indication, TRX -> L1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockInd {
    pub fn_num: u32,
}

impl ClockInd {
    pub fn from_bytes(data: &[u8]) -> Result<Self, PduParseErr> {
        let text = pdu_text(data)?;
        let mut tokens = text.split_whitespace();
        if tokens.next() != Some("IND") || tokens.next() != Some("CLOCK") {
            return Err(PduParseErr::Inconsistency { field: "trxc", reason: "not a clock indication" });
        }
        let fn_num = tokens
            .next()
            .ok_or(PduParseErr::BufferEnded { field: Some("fn") })?
            .parse()
            .map_err(|_| PduParseErr::Inconsistency { field: "fn", reason: "not an integer" })?;
        Ok(Self { fn_num })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        to_wire(format!("IND CLOCK {}", self.fn_num))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_parse() {
        let cmd = CtrlCmd::from_bytes(b"CMD SETFH 5 3 9000 9002\0").unwrap();
        assert_eq!(cmd.verb, "SETFH");
        assert_eq!(cmd.args, vec!["5", "3", "9000", "9002"]);
        assert_eq!(cmd.arg::<u8>(0), Some(5));
        assert_eq!(cmd.arg::<u8>(9), None);
        assert_eq!(cmd.int_args(), Some(vec![5, 3, 9000, 9002]));

        let cmd = CtrlCmd::from_bytes(b"CMD POWERON").unwrap();
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.to_bytes(), b"CMD POWERON\0".to_vec());

        assert!(CtrlCmd::from_bytes(b"RSP POWERON 0\0").is_err());
        assert!(CtrlCmd::from_bytes(b"CMD\0").is_err());
        assert_eq!(CtrlCmd::from_bytes(b"CMD SETTA x\0").unwrap().int_args(), None);
    }

    #[test]
    fn test_rsp_format() {
        let cmd = CtrlCmd::new("MEASURE", &["947600"]);
        let rsp = CtrlRsp::for_cmd(&cmd, 0, &["-60".to_string()]);
        assert_eq!(rsp.to_bytes(), b"RSP MEASURE 0 947600 -60\0".to_vec());
        assert_eq!(CtrlRsp::from_bytes(&rsp.to_bytes()).unwrap(), rsp);

        let rsp = CtrlRsp::for_cmd(&CtrlCmd::new("POWERON", &[]), -1, &[]);
        assert_eq!(rsp.to_string(), "RSP POWERON -1");
    }

    #[test]
    fn test_clock_ind() {
        let ind = ClockInd { fn_num: 102 };
        assert_eq!(ind.to_bytes(), b"IND CLOCK 102\0".to_vec());
        assert_eq!(ClockInd::from_bytes(b"IND CLOCK 102\0").unwrap(), ind);
        assert!(ClockInd::from_bytes(b"IND FOO 1\0").is_err());
    }
}
