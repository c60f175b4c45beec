use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Transceiver definition as given on the command line: `REMOTE_ADDR:BASE_PORT[/CHILD_IDX]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrxDef {
    pub remote_addr: IpAddr,
    pub base_port: u16,
    pub child_idx: u8,
}

impl FromStr for TrxDef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid TRX definition: {}", s);

        let (addr_port, child_idx) = match s.split_once('/') {
            Some((ap, idx)) => (ap, idx.parse::<u8>().map_err(|_| invalid())?),
            None => (s, 0),
        };
        let (addr, port) = addr_port.rsplit_once(':').ok_or_else(invalid)?;
        let addr = addr.trim_start_matches('[').trim_end_matches(']');

        Ok(TrxDef {
            remote_addr: addr.parse().map_err(|_| invalid())?,
            base_port: port.parse().map_err(|_| invalid())?,
            child_idx,
        })
    }
}

impl fmt::Display for TrxDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.remote_addr, self.base_port)?;
        if self.child_idx > 0 {
            write!(f, "/{}", self.child_idx)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_parse_trx_def() {
        let def: TrxDef = "127.0.0.1:5703".parse().unwrap();
        assert_eq!(def.remote_addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(def.base_port, 5703);
        assert_eq!(def.child_idx, 0);

        let def: TrxDef = "10.0.0.2:5700/2".parse().unwrap();
        assert_eq!(def.remote_addr, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(def.base_port, 5700);
        assert_eq!(def.child_idx, 2);
        assert_eq!(def.to_string(), "10.0.0.2:5700/2");
    }

    #[test]
    fn test_parse_trx_def_invalid() {
        assert!("127.0.0.1".parse::<TrxDef>().is_err());
        assert!("127.0.0.1:".parse::<TrxDef>().is_err());
        assert!("127.0.0.1:port".parse::<TrxDef>().is_err());
        assert!("127.0.0.1:5700/".parse::<TrxDef>().is_err());
        assert!("127.0.0.1:5700/x".parse::<TrxDef>().is_err());
        assert!("127.0.0.1:70000".parse::<TrxDef>().is_err());
        assert!("localhost:5700".parse::<TrxDef>().is_err());
    }
}
