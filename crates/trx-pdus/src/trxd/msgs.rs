use core::fmt;

use trx_core::bits::{sbits2ubits, sbits2usbits, ubits2sbits, usbits2sbits};
use trx_core::{BitBuffer, GSM_HYPERFRAME, Modulation, PduParseErr, expect_range};

use super::fields::{PduFields, decode_fields, encode_fields};
use super::layouts::{is_supported, rx_layout, tx_layout};

pub const TN_MAX: u8 = 7;
pub const TSC_MAX: u8 = 7;
pub const TRXN_MAX: u8 = 63;
pub const RSSI_MIN: i16 = -120;
pub const RSSI_MAX: i16 = -47;
pub const CI_MIN: i16 = -1280;
pub const CI_MAX: i16 = 1280;

/// Reads the header version of a raw TRXD PDU without decoding it
pub fn peek_version(data: &[u8]) -> Result<u8, PduParseErr> {
    data.first().map(|b| b >> 4).ok_or(PduParseErr::BufferEnded { field: Some("ver") })
}

fn check_common(ver: u8, fn_num: u32, tn: u8, trxn: u8) -> Result<(), PduParseErr> {
    if !is_supported(ver) {
        return Err(PduParseErr::UnsupportedVersion { version: ver });
    }
    expect_range!(fn_num, 0, GSM_HYPERFRAME - 1, "fn")?;
    expect_range!(tn, 0, TN_MAX)?;
    if ver >= 2 {
        expect_range!(trxn, 0, TRXN_MAX)?;
    }
    Ok(())
}

/// Checks modulation, training sequence and burst presence/length
fn check_burst(
    ver: u8,
    nope_ind: bool,
    modulation: Modulation,
    tsc_set: u8,
    tsc: u8,
    burst_len: Option<usize>,
) -> Result<(), PduParseErr> {
    // MTS info is not carried by v0, and ignored for NOPE
    if ver >= 1 && !nope_ind {
        expect_range!(tsc, 0, TSC_MAX)?;
        expect_range!(tsc_set, 0, modulation.num_tsc_sets() - 1, "tsc_set")?;
    }

    match (nope_ind, burst_len) {
        (true, Some(_)) => Err(PduParseErr::Inconsistency { field: "burst", reason: "NOPE indication with burst" }),
        (true, None) if ver == 0 => Err(PduParseErr::Inconsistency { field: "nope", reason: "no NOPE indication in TRXDv0" }),
        (true, None) => Ok(()),
        (false, None) => Err(PduParseErr::Inconsistency { field: "burst", reason: "burst bits are not set" }),
        (false, Some(len)) if len != modulation.burst_len() => {
            Err(PduParseErr::InconsistentLength { expected: modulation.burst_len(), found: len })
        }
        (false, Some(_)) => Ok(()),
    }
}

/// Unpacks MTS info from decoded fields
fn mts_from_fields(f: &PduFields) -> Result<(Modulation, u8, u8), PduParseErr> {
    if f.nope {
        return Ok((Modulation::Gmsk, 0, 0));
    }
    let (modulation, tsc_set) = Modulation::unpack_mts_bits(f.mod_bits)
        .ok_or(PduParseErr::InvalidValue { field: "mts", value: f.mod_bits as i64 })?;
    Ok((modulation, tsc_set, f.tsc))
}

/// Modulation of a version 0/1 burst, which carries no MTS field
fn modulation_from_len(burst: &Option<Vec<u8>>) -> Modulation {
    burst
        .as_ref()
        .and_then(|b| Modulation::from_burst_len(b.len()))
        .unwrap_or(Modulation::Gmsk)
}

fn finish_decode(buf: &BitBuffer) -> Result<(), PduParseErr> {
    match buf.get_octets_remaining() {
        0 => Ok(()),
        count => Err(PduParseErr::TrailingBytes { count }),
    }
}

fn check_batch<T>(msgs: &[T], ver: impl Fn(&T) -> u8, fn_num: impl Fn(&T) -> u32) -> Result<(), PduParseErr> {
    let Some(first) = msgs.first() else {
        return Err(PduParseErr::Inconsistency { field: "batch", reason: "empty batch" });
    };
    if msgs.len() > 1 && ver(first) < 2 {
        return Err(PduParseErr::Inconsistency { field: "batch", reason: "batching requires TRXDv2" });
    }
    if msgs.iter().any(|m| ver(m) != ver(first) || fn_num(m) != fn_num(first)) {
        return Err(PduParseErr::Inconsistency { field: "batch", reason: "batched PDUs differ in version or frame number" });
    }
    Ok(())
}

/// TRXD Tx message (L1 -> TRX): a burst to be transmitted, as hard-bits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxMsg {
    pub ver: u8,
    pub fn_num: u32,
    pub tn: u8,
    /// Transceiver number (v2 only)
    pub trxn: u8,
    /// Transmit power attenuation in dB
    pub pwr: u8,
    /// NOPE request: nothing to transmit (v2 only)
    pub nope_ind: bool,
    pub modulation: Modulation,
    pub tsc_set: u8,
    pub tsc: u8,
    /// SCPIR for AQPSK, in dB (v2 only)
    pub scpir: i8,
    pub burst: Option<Vec<u8>>,
}

impl TxMsg {
    /// New message without burst-specific parameters. The modulation follows from the burst length.
    pub fn new(ver: u8, fn_num: u32, tn: u8, burst: Option<Vec<u8>>) -> Self {
        Self {
            ver,
            fn_num,
            tn,
            trxn: 0,
            pwr: 0,
            nope_ind: burst.is_none(),
            modulation: modulation_from_len(&burst),
            tsc_set: 0,
            tsc: 0,
            scpir: 0,
            burst,
        }
    }

    pub fn validate(&self) -> Result<(), PduParseErr> {
        check_common(self.ver, self.fn_num, self.tn, self.trxn)?;
        if self.ver < 2 && self.nope_ind {
            return Err(PduParseErr::Inconsistency { field: "nope", reason: "no NOPE request before TRXDv2" });
        }
        check_burst(
            self.ver.max(1),
            self.nope_ind,
            self.modulation,
            self.tsc_set,
            self.tsc,
            self.burst.as_ref().map(|b| b.len()),
        )?;
        if let Some(burst) = &self.burst {
            if let Some(&bit) = burst.iter().find(|&&b| b > 1) {
                return Err(PduParseErr::InvalidValue { field: "hard-bits", value: bit as i64 });
            }
        }
        Ok(())
    }

    fn to_fields(&self) -> PduFields {
        PduFields {
            ver: self.ver,
            tn: self.tn,
            trxn: if self.ver >= 2 { self.trxn } else { 0 },
            fn_num: self.fn_num,
            pwr: self.pwr,
            scpir: self.scpir,
            nope: self.nope_ind,
            mod_bits: if self.nope_ind { 0 } else { self.modulation.pack_mts_bits(self.tsc_set) },
            tsc: if self.nope_ind { 0 } else { self.tsc },
            burst: self.burst.clone(),
            ..Default::default()
        }
    }

    fn from_fields(f: &PduFields) -> Result<Self, PduParseErr> {
        let (modulation, tsc_set, tsc) = if f.ver >= 2 {
            mts_from_fields(f)?
        } else {
            (modulation_from_len(&f.burst), 0, 0)
        };
        let msg = Self {
            ver: f.ver,
            fn_num: f.fn_num,
            tn: f.tn,
            trxn: f.trxn,
            pwr: f.pwr,
            nope_ind: f.nope,
            modulation,
            tsc_set,
            tsc,
            scpir: f.scpir,
            burst: f.burst.clone(),
        };
        msg.validate()?;
        Ok(msg)
    }

    /// Encodes a single message into a TRXD PDU
    pub fn to_bytes(&self) -> Result<Vec<u8>, PduParseErr> {
        Self::batch_to_bytes(std::slice::from_ref(self))
    }

    /// Encodes several messages sharing one frame number into a single batched TRXDv2 PDU
    pub fn batch_to_bytes(msgs: &[TxMsg]) -> Result<Vec<u8>, PduParseErr> {
        check_batch(msgs, |m| m.ver, |m| m.fn_num)?;
        for msg in msgs {
            msg.validate()?;
        }
        let first = &msgs[0];
        let layout = tx_layout(first.ver).ok_or(PduParseErr::UnsupportedVersion { version: first.ver })?;

        let mut fields = first.to_fields();
        fields.bpdus = msgs[1..].iter().map(|m| m.to_fields()).collect();
        fields.batch = !fields.bpdus.is_empty();

        let mut buf = BitBuffer::new_autoexpand(16 + first.burst.as_ref().map_or(0, |b| b.len()));
        encode_fields(layout, &fields, &mut buf)?;
        Ok(buf.into_bytes())
    }

    /// Decodes a TRXD PDU holding exactly one message
    pub fn from_bytes(data: &[u8]) -> Result<Self, PduParseErr> {
        let mut msgs = Self::batch_from_bytes(data)?;
        if msgs.len() != 1 {
            return Err(PduParseErr::Inconsistency { field: "batch", reason: "PDU carries batched messages" });
        }
        Ok(msgs.remove(0))
    }

    /// Decodes a TRXD PDU into all messages it carries
    pub fn batch_from_bytes(data: &[u8]) -> Result<Vec<Self>, PduParseErr> {
        let ver = peek_version(data)?;
        let layout = tx_layout(ver).ok_or(PduParseErr::UnsupportedVersion { version: ver })?;

        let mut buf = BitBuffer::from_bytes(data);
        let mut fields = PduFields::default();
        decode_fields(layout, &mut fields, &mut buf)?;
        finish_decode(&buf)?;

        let mut msgs = Vec::with_capacity(1 + fields.bpdus.len());
        msgs.push(Self::from_fields(&fields)?);
        for bpdu in &fields.bpdus {
            msgs.push(Self::from_fields(bpdu)?);
        }
        Ok(msgs)
    }

    /// Transforms this message into an Rx message of the given version, as if it
    /// was received over the air. Measurement fields are left for the caller to fill.
    pub fn to_rx(&self, ver: u8) -> RxMsg {
        let mut msg = RxMsg::new(ver, self.fn_num, self.tn, self.burst.as_deref().map(ubits2sbits));
        msg.trxn = self.trxn;
        if msg.burst.is_some() {
            msg.modulation = self.modulation;
            msg.tsc_set = self.tsc_set;
            msg.tsc = self.tsc;
        }
        msg
    }
}

impl fmt::Display for TxMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxMsg v{} fn={} tn={} pwr={}", self.ver, self.fn_num, self.tn, self.pwr)?;
        if self.ver >= 2 {
            write!(f, " trxn={}", self.trxn)?;
        }
        match &self.burst {
            Some(b) => write!(f, " {} ({} bits)", self.modulation, b.len()),
            None => write!(f, " NOPE"),
        }
    }
}

/// TRXD Rx message (TRX -> L1): a received burst as soft-bits, with measurements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxMsg {
    pub ver: u8,
    pub fn_num: u32,
    pub tn: u8,
    /// Transceiver number (v2 only)
    pub trxn: u8,
    /// Received signal strength in dBm
    pub rssi: i16,
    /// Timing of arrival in 1/256 symbol periods
    pub toa256: i16,
    /// NOPE / IDLE indication: nothing detected (v1 and higher)
    pub nope_ind: bool,
    pub modulation: Modulation,
    pub tsc_set: u8,
    pub tsc: u8,
    /// Carrier to interference ratio in centiBels (v1 and higher)
    pub ci: i16,
    /// Signed soft-bits, -127..127
    pub burst: Option<Vec<i8>>,
}

impl RxMsg {
    pub fn new(ver: u8, fn_num: u32, tn: u8, burst: Option<Vec<i8>>) -> Self {
        let modulation = burst
            .as_ref()
            .and_then(|b| Modulation::from_burst_len(b.len()))
            .unwrap_or(Modulation::Gmsk);
        Self {
            ver,
            fn_num,
            tn,
            trxn: 0,
            rssi: RSSI_MIN,
            toa256: 0,
            nope_ind: burst.is_none(),
            modulation,
            tsc_set: 0,
            tsc: 0,
            ci: 0,
            burst,
        }
    }

    pub fn validate(&self) -> Result<(), PduParseErr> {
        check_common(self.ver, self.fn_num, self.tn, self.trxn)?;
        expect_range!(self.rssi, RSSI_MIN, RSSI_MAX, "rssi")?;
        if self.ver >= 1 {
            expect_range!(self.ci, CI_MIN, CI_MAX, "ci")?;
        }
        check_burst(
            self.ver,
            self.nope_ind,
            self.modulation,
            self.tsc_set,
            self.tsc,
            self.burst.as_ref().map(|b| b.len()),
        )?;
        if let Some(burst) = &self.burst {
            if burst.contains(&i8::MIN) {
                return Err(PduParseErr::InvalidValue { field: "soft-bits", value: i8::MIN as i64 });
            }
        }
        Ok(())
    }

    fn to_fields(&self) -> PduFields {
        PduFields {
            ver: self.ver,
            tn: self.tn,
            trxn: if self.ver >= 2 { self.trxn } else { 0 },
            fn_num: self.fn_num,
            rssi: self.rssi,
            toa256: self.toa256,
            ci: self.ci,
            nope: self.nope_ind,
            mod_bits: if self.nope_ind { 0 } else { self.modulation.pack_mts_bits(self.tsc_set) },
            tsc: if self.nope_ind { 0 } else { self.tsc },
            burst: self.burst.as_deref().map(sbits2usbits),
            ..Default::default()
        }
    }

    fn from_fields(f: &PduFields) -> Result<Self, PduParseErr> {
        let (modulation, tsc_set, tsc) = if f.ver >= 1 {
            mts_from_fields(f)?
        } else {
            (modulation_from_len(&f.burst), 0, 0)
        };
        let msg = Self {
            ver: f.ver,
            fn_num: f.fn_num,
            tn: f.tn,
            trxn: f.trxn,
            rssi: f.rssi,
            toa256: f.toa256,
            nope_ind: f.nope,
            modulation,
            tsc_set,
            tsc,
            ci: if f.ver >= 1 { f.ci } else { 0 },
            burst: f.burst.as_deref().map(usbits2sbits),
        };
        msg.validate()?;
        Ok(msg)
    }

    /// Encodes a single message into a TRXD PDU
    pub fn to_bytes(&self) -> Result<Vec<u8>, PduParseErr> {
        Self::encode(std::slice::from_ref(self), false)
    }

    /// Like `to_bytes`, appending the 2 padding octets some legacy TRXDv0 receivers expect
    pub fn to_bytes_legacy(&self) -> Result<Vec<u8>, PduParseErr> {
        Self::encode(std::slice::from_ref(self), true)
    }

    /// Encodes several messages sharing one frame number into a single batched TRXDv2 PDU
    pub fn batch_to_bytes(msgs: &[RxMsg]) -> Result<Vec<u8>, PduParseErr> {
        Self::encode(msgs, false)
    }

    fn encode(msgs: &[RxMsg], legacy_padding: bool) -> Result<Vec<u8>, PduParseErr> {
        check_batch(msgs, |m| m.ver, |m| m.fn_num)?;
        for msg in msgs {
            msg.validate()?;
        }
        let first = &msgs[0];
        let layout = rx_layout(first.ver).ok_or(PduParseErr::UnsupportedVersion { version: first.ver })?;

        let mut fields = first.to_fields();
        fields.pad = legacy_padding && first.ver == 0;
        fields.bpdus = msgs[1..].iter().map(|m| m.to_fields()).collect();
        fields.batch = !fields.bpdus.is_empty();

        let mut buf = BitBuffer::new_autoexpand(16 + first.burst.as_ref().map_or(0, |b| b.len()));
        encode_fields(layout, &fields, &mut buf)?;
        Ok(buf.into_bytes())
    }

    /// Decodes a TRXD PDU holding exactly one message
    pub fn from_bytes(data: &[u8]) -> Result<Self, PduParseErr> {
        let mut msgs = Self::batch_from_bytes(data)?;
        if msgs.len() != 1 {
            return Err(PduParseErr::Inconsistency { field: "batch", reason: "PDU carries batched messages" });
        }
        Ok(msgs.remove(0))
    }

    /// Decodes a TRXD PDU into all messages it carries
    pub fn batch_from_bytes(data: &[u8]) -> Result<Vec<Self>, PduParseErr> {
        let ver = peek_version(data)?;
        let layout = rx_layout(ver).ok_or(PduParseErr::UnsupportedVersion { version: ver })?;

        let mut buf = BitBuffer::from_bytes(data);
        let mut fields = PduFields::default();
        decode_fields(layout, &mut fields, &mut buf)?;
        finish_decode(&buf)?;

        let mut msgs = Vec::with_capacity(1 + fields.bpdus.len());
        msgs.push(Self::from_fields(&fields)?);
        for bpdu in &fields.bpdus {
            msgs.push(Self::from_fields(bpdu)?);
        }
        Ok(msgs)
    }

    /// Transforms this message into a Tx message of the given version, hard-deciding the soft-bits
    pub fn to_tx(&self, ver: u8) -> TxMsg {
        let mut msg = TxMsg::new(ver, self.fn_num, self.tn, self.burst.as_deref().map(sbits2ubits));
        msg.trxn = self.trxn;
        if msg.burst.is_some() {
            msg.modulation = self.modulation;
            msg.tsc_set = self.tsc_set;
            msg.tsc = self.tsc;
        }
        msg
    }
}

impl fmt::Display for RxMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RxMsg v{} fn={} tn={} rssi={} toa256={}",
            self.ver, self.fn_num, self.tn, self.rssi, self.toa256
        )?;
        if self.ver >= 1 {
            write!(f, " ci={}", self.ci)?;
        }
        match &self.burst {
            Some(b) => write!(f, " {} tsc={}/{} ({} bits)", self.modulation, self.tsc_set, self.tsc, b.len()),
            None => write!(f, " NOPE"),
        }
    }
}
