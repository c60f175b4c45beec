//! Declarative TRXD field codec.
//!
//! A PDU layout is a static, ordered list of [`Field`] variants. Each variant knows
//! how to move one slot of [`PduFields`] to and from the wire. Concrete PDUs for every
//! header version and direction are assembled in [`super::layouts`].

use trx_core::{BitBuffer, Modulation, PduParseErr};

/// Raw field values of one TRXD PDU, as present on the wire
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PduFields {
    pub ver: u8,
    pub tn: u8,
    /// Another batched PDU follows this one (v2)
    pub batch: bool,
    /// Shadow indication of a batched PDU (v2)
    pub shadow: bool,
    pub trxn: u8,
    pub fn_num: u32,
    pub pwr: u8,
    pub scpir: i8,
    pub rssi: i16,
    pub toa256: i16,
    pub ci: i16,
    pub nope: bool,
    /// Middle 4 bits of the MTS octet: modulation and TSC set
    pub mod_bits: u8,
    pub tsc: u8,
    /// Burst octets as carried on the wire: hard-bits or unsigned soft-bits
    pub burst: Option<Vec<u8>>,
    /// Legacy 2-octet padding after a v0 Rx burst
    pub pad: bool,
    /// Batched PDUs following this one
    pub bpdus: Vec<PduFields>,
}

/// Slots of [`PduFields`] that are packed into bit fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitSlot {
    Ver,
    Tn,
    Batch,
    Shadow,
    Trxn,
    Nope,
    ModBits,
    Tsc,
    Spare,
}

/// One sub-octet field within a [`Field::Bits`] set
#[derive(Debug, Clone, Copy)]
pub struct BitField {
    pub name: &'static str,
    pub slot: BitSlot,
    pub width: usize,
}

impl BitField {
    pub const fn new(name: &'static str, slot: BitSlot, width: usize) -> Self {
        Self { name, slot, width }
    }

    pub const fn spare(width: usize) -> Self {
        Self { name: "spare", slot: BitSlot::Spare, width }
    }

    fn get(&self, f: &PduFields) -> u64 {
        match self.slot {
            BitSlot::Ver => f.ver as u64,
            BitSlot::Tn => f.tn as u64,
            BitSlot::Batch => f.batch as u64,
            BitSlot::Shadow => f.shadow as u64,
            BitSlot::Trxn => f.trxn as u64,
            BitSlot::Nope => f.nope as u64,
            BitSlot::ModBits => f.mod_bits as u64,
            BitSlot::Tsc => f.tsc as u64,
            BitSlot::Spare => 0,
        }
    }

    fn set(&self, f: &mut PduFields, v: u64) {
        match self.slot {
            BitSlot::Ver => f.ver = v as u8,
            BitSlot::Tn => f.tn = v as u8,
            BitSlot::Batch => f.batch = v != 0,
            BitSlot::Shadow => f.shadow = v != 0,
            BitSlot::Trxn => f.trxn = v as u8,
            BitSlot::Nope => f.nope = v != 0,
            BitSlot::ModBits => f.mod_bits = v as u8,
            BitSlot::Tsc => f.tsc = v as u8,
            BitSlot::Spare => {}
        }
    }
}

/// Slots of [`PduFields`] that are carried as whole-octet integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntSlot {
    Fn,
    Pwr,
    Scpir,
    Rssi,
    Toa256,
    Ci,
}

/// Wire representation of an integer field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    U8,
    I8,
    I16Be,
    U32Be,
}

impl IntKind {
    fn octets(self) -> usize {
        match self {
            IntKind::U8 | IntKind::I8 => 1,
            IntKind::I16Be => 2,
            IntKind::U32Be => 4,
        }
    }

    fn range(self) -> (i64, i64) {
        match self {
            IntKind::U8 => (0, u8::MAX as i64),
            IntKind::I8 => (i8::MIN as i64, i8::MAX as i64),
            IntKind::I16Be => (i16::MIN as i64, i16::MAX as i64),
            IntKind::U32Be => (0, u32::MAX as i64),
        }
    }

    fn is_signed(self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16Be)
    }
}

/// Length rule for a burst field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstLen {
    /// Fills the rest of the PDU: 148 (GMSK) or 444 (8-PSK) octets
    Remaining,
    /// Like `Remaining`, tolerating 2 trailing padding octets
    RemainingPadded,
    /// Implied by the modulation in the MTS field; absent when NOPE is set
    ByMts,
}

/// A single field in a TRXD PDU layout
#[derive(Debug, Clone, Copy)]
pub enum Field {
    /// Bit-packed set of fields, MSB first, spanning whole octets
    Bits(&'static [BitField]),
    /// Fixed-width integer, multiplied by `mult` on the wire
    Int { name: &'static str, slot: IntSlot, kind: IntKind, mult: i8 },
    /// Reserved octets, zero on encode and ignored on decode
    Spare(usize),
    /// Variable-length burst buffer
    Burst { name: &'static str, len: BurstLen },
    /// Sequence of batched sub-PDUs, chained by the `batch` flag
    Batch(&'static [Field]),
}

fn int_get(f: &PduFields, slot: IntSlot) -> i64 {
    match slot {
        IntSlot::Fn => f.fn_num as i64,
        IntSlot::Pwr => f.pwr as i64,
        IntSlot::Scpir => f.scpir as i64,
        IntSlot::Rssi => f.rssi as i64,
        IntSlot::Toa256 => f.toa256 as i64,
        IntSlot::Ci => f.ci as i64,
    }
}

fn int_set(f: &mut PduFields, slot: IntSlot, name: &'static str, v: i64) -> Result<(), PduParseErr> {
    let invalid = || PduParseErr::InvalidValue { field: name, value: v };
    match slot {
        IntSlot::Fn => f.fn_num = u32::try_from(v).map_err(|_| invalid())?,
        IntSlot::Pwr => f.pwr = u8::try_from(v).map_err(|_| invalid())?,
        IntSlot::Scpir => f.scpir = i8::try_from(v).map_err(|_| invalid())?,
        IntSlot::Rssi => f.rssi = i16::try_from(v).map_err(|_| invalid())?,
        IntSlot::Toa256 => f.toa256 = i16::try_from(v).map_err(|_| invalid())?,
        IntSlot::Ci => f.ci = i16::try_from(v).map_err(|_| invalid())?,
    }
    Ok(())
}

/// Burst length implied by the MTS field
fn burst_len_by_mts(f: &PduFields) -> Result<usize, PduParseErr> {
    Modulation::unpack_mts_bits(f.mod_bits)
        .map(|(m, _)| m.burst_len())
        .ok_or(PduParseErr::InvalidValue { field: "mts", value: f.mod_bits as i64 })
}

fn is_plain_burst_len(len: usize) -> bool {
    len == Modulation::Gmsk.burst_len() || len == Modulation::Psk8.burst_len()
}

impl Field {
    pub fn encode(&self, f: &PduFields, buf: &mut BitBuffer) -> Result<(), PduParseErr> {
        match *self {
            Field::Bits(set) => {
                for bf in set {
                    let v = bf.get(f);
                    if v >> bf.width != 0 {
                        return Err(PduParseErr::InvalidValue { field: bf.name, value: v as i64 });
                    }
                    buf.write_bits(v, bf.width);
                }
            }
            Field::Int { name, slot, kind, mult } => {
                let v = int_get(f, slot) * mult as i64;
                let (min, max) = kind.range();
                if v < min || v > max {
                    return Err(PduParseErr::InvalidValue { field: name, value: int_get(f, slot) });
                }
                let width = kind.octets() * 8;
                // Two's complement, truncated to the field width
                let raw = if width == 64 { v as u64 } else { (v as u64) & ((1u64 << width) - 1) };
                buf.write_bits(raw, width);
            }
            Field::Spare(n) => buf.write_zero_octets(n),
            Field::Burst { name, len } => {
                let expected = match len {
                    BurstLen::ByMts if f.nope => {
                        if f.burst.is_some() {
                            return Err(PduParseErr::Inconsistency { field: name, reason: "NOPE indication with burst" });
                        }
                        return Ok(());
                    }
                    BurstLen::ByMts => Some(burst_len_by_mts(f)?),
                    BurstLen::Remaining | BurstLen::RemainingPadded => None,
                };
                let Some(burst) = f.burst.as_deref() else {
                    return Err(PduParseErr::Inconsistency { field: name, reason: "burst bits are not set" });
                };
                match expected {
                    Some(exp) if exp != burst.len() => {
                        return Err(PduParseErr::InconsistentLength { expected: exp, found: burst.len() });
                    }
                    None if !is_plain_burst_len(burst.len()) => {
                        return Err(PduParseErr::Inconsistency { field: name, reason: "burst is neither GMSK nor 8-PSK" });
                    }
                    _ => {}
                }
                buf.write_octets(burst);
                if len == BurstLen::RemainingPadded && f.pad {
                    buf.write_zero_octets(2);
                }
            }
            Field::Batch(layout) => {
                for (i, bpdu) in f.bpdus.iter().enumerate() {
                    let mut bpdu = bpdu.clone();
                    bpdu.batch = i + 1 < f.bpdus.len();
                    encode_fields(layout, &bpdu, buf)?;
                }
            }
        }
        Ok(())
    }

    pub fn decode(&self, f: &mut PduFields, buf: &mut BitBuffer) -> Result<(), PduParseErr> {
        match *self {
            Field::Bits(set) => {
                for bf in set {
                    let v = buf.read_field(bf.width, bf.name)?;
                    bf.set(f, v);
                }
            }
            Field::Int { name, slot, kind, mult } => {
                let width = kind.octets() * 8;
                let raw = buf.read_field(width, name)?;
                let v = if kind.is_signed() {
                    // Sign-extend from the field width
                    ((raw << (64 - width)) as i64) >> (64 - width)
                } else {
                    raw as i64
                };
                int_set(f, slot, name, v * mult as i64)?;
            }
            Field::Spare(n) => buf.skip_octets(n, "spare")?,
            Field::Burst { name, len } => {
                let remaining = buf.get_octets_remaining();
                let burst_len = match len {
                    BurstLen::ByMts if f.nope => {
                        f.burst = None;
                        return Ok(());
                    }
                    BurstLen::ByMts => burst_len_by_mts(f)?,
                    BurstLen::Remaining if is_plain_burst_len(remaining) => remaining,
                    BurstLen::RemainingPadded if is_plain_burst_len(remaining) => remaining,
                    BurstLen::RemainingPadded if remaining >= 2 && is_plain_burst_len(remaining - 2) => {
                        f.pad = true;
                        remaining - 2
                    }
                    BurstLen::Remaining | BurstLen::RemainingPadded => {
                        return Err(PduParseErr::Inconsistency { field: name, reason: "unexpected burst length" });
                    }
                };
                f.burst = Some(buf.read_octets(burst_len, name)?.to_vec());
                if f.pad {
                    buf.skip_octets(2, "pad")?;
                }
            }
            Field::Batch(layout) => {
                let mut more = f.batch;
                while more {
                    let mut bpdu = PduFields { ver: f.ver, fn_num: f.fn_num, ..Default::default() };
                    decode_fields(layout, &mut bpdu, buf)?;
                    more = bpdu.batch;
                    f.bpdus.push(bpdu);
                }
            }
        }
        Ok(())
    }
}

pub fn encode_fields(layout: &[Field], f: &PduFields, buf: &mut BitBuffer) -> Result<(), PduParseErr> {
    layout.iter().try_for_each(|field| field.encode(f, buf))
}

pub fn decode_fields(layout: &[Field], f: &mut PduFields, buf: &mut BitBuffer) -> Result<(), PduParseErr> {
    layout.iter().try_for_each(|field| field.decode(f, buf))
}
