//! Static TRXD PDU layouts for header versions 0, 1 and 2.
//!
//! ```text
//! Tx v0/v1:  VER:4 RFU:1 TN:3 | FN:32 | PWR:8 | hard-bits
//! Rx v0:     VER:4 RFU:1 TN:3 | FN:32 | -RSSI:8 | TOA256:16 | soft-bits [| pad:16]
//! Rx v1:     VER:4 RFU:1 TN:3 | FN:32 | -RSSI:8 | TOA256:16 | MTS:8 | C/I:16 | soft-bits
//! Tx v2:     VER:4 RFU:1 TN:3 | BATCH:1 RFU:1 TRXN:6 | MTS:8 | PWR:8 | SCPIR:8 | RFU:24
//!            | FN:32 | hard-bits [| batched PDUs]
//! Rx v2:     VER:4 RFU:1 TN:3 | BATCH:1 RFU:1 TRXN:6 | MTS:8 | -RSSI:8 | TOA256:16 | C/I:16
//!            | FN:32 | soft-bits [| batched PDUs]
//! ```
//!
//! Batched PDUs repeat the v2 layout without the frame number, with the version
//! bits reserved and the second header octet carrying a SHADOW flag.

use super::fields::{BitField, BitSlot, BurstLen, Field, IntKind, IntSlot};

/// Header versions this codec understands
pub const SUPPORTED_VERSIONS: [u8; 3] = [0, 1, 2];

/// Highest version that fits the 4-bit header field
pub const VERSION_FIELD_MAX: u8 = 0b1111;

pub fn is_supported(ver: u8) -> bool {
    SUPPORTED_VERSIONS.contains(&ver)
}

/// Highest supported version less than or equal to `ver`, if any
pub fn best_supported(ver: u8) -> Option<u8> {
    SUPPORTED_VERSIONS.iter().rev().copied().find(|&v| v <= ver)
}

const HDR_V0_V1: [BitField; 3] = [
    BitField::new("ver", BitSlot::Ver, 4),
    BitField::spare(1),
    BitField::new("tn", BitSlot::Tn, 3),
];

const HDR_V2: [BitField; 6] = [
    BitField::new("ver", BitSlot::Ver, 4),
    BitField::spare(1),
    BitField::new("tn", BitSlot::Tn, 3),
    BitField::new("batch", BitSlot::Batch, 1),
    BitField::spare(1),
    BitField::new("trxn", BitSlot::Trxn, 6),
];

const HDR_V2_BATCHED: [BitField; 6] = [
    BitField::spare(4),
    BitField::spare(1),
    BitField::new("tn", BitSlot::Tn, 3),
    BitField::new("batch", BitSlot::Batch, 1),
    BitField::new("shadow", BitSlot::Shadow, 1),
    BitField::new("trxn", BitSlot::Trxn, 6),
];

const MTS: [BitField; 3] = [
    BitField::new("nope", BitSlot::Nope, 1),
    BitField::new("mts", BitSlot::ModBits, 4),
    BitField::new("tsc", BitSlot::Tsc, 3),
];

const FN: Field = Field::Int { name: "fn", slot: IntSlot::Fn, kind: IntKind::U32Be, mult: 1 };
const PWR: Field = Field::Int { name: "pwr", slot: IntSlot::Pwr, kind: IntKind::U8, mult: 1 };
const SCPIR: Field = Field::Int { name: "scpir", slot: IntSlot::Scpir, kind: IntKind::I8, mult: 1 };
const RSSI: Field = Field::Int { name: "rssi", slot: IntSlot::Rssi, kind: IntKind::U8, mult: -1 };
const TOA256: Field = Field::Int { name: "toa256", slot: IntSlot::Toa256, kind: IntKind::I16Be, mult: 1 };
const CI: Field = Field::Int { name: "ci", slot: IntSlot::Ci, kind: IntKind::I16Be, mult: 1 };

const HARD_BITS: Field = Field::Burst { name: "hard-bits", len: BurstLen::Remaining };
const HARD_BITS_MTS: Field = Field::Burst { name: "hard-bits", len: BurstLen::ByMts };
const SOFT_BITS_V0: Field = Field::Burst { name: "soft-bits", len: BurstLen::RemainingPadded };
const SOFT_BITS_MTS: Field = Field::Burst { name: "soft-bits", len: BurstLen::ByMts };

pub const TX_V0_V1: [Field; 4] = [Field::Bits(&HDR_V0_V1), FN, PWR, HARD_BITS];

pub const RX_V0: [Field; 5] = [Field::Bits(&HDR_V0_V1), FN, RSSI, TOA256, SOFT_BITS_V0];

pub const RX_V1: [Field; 7] = [Field::Bits(&HDR_V0_V1), FN, RSSI, TOA256, Field::Bits(&MTS), CI, SOFT_BITS_MTS];

const TX_V2_BPDU: [Field; 6] = [
    Field::Bits(&HDR_V2_BATCHED),
    Field::Bits(&MTS),
    PWR,
    SCPIR,
    Field::Spare(3),
    HARD_BITS_MTS,
];

pub const TX_V2: [Field; 8] = [
    Field::Bits(&HDR_V2),
    Field::Bits(&MTS),
    PWR,
    SCPIR,
    Field::Spare(3),
    FN,
    HARD_BITS_MTS,
    Field::Batch(&TX_V2_BPDU),
];

const RX_V2_BPDU: [Field; 6] = [
    Field::Bits(&HDR_V2_BATCHED),
    Field::Bits(&MTS),
    RSSI,
    TOA256,
    CI,
    SOFT_BITS_MTS,
];

pub const RX_V2: [Field; 8] = [
    Field::Bits(&HDR_V2),
    Field::Bits(&MTS),
    RSSI,
    TOA256,
    CI,
    FN,
    SOFT_BITS_MTS,
    Field::Batch(&RX_V2_BPDU),
];

/// Layout of a Tx (L1 -> TRX) PDU for the given header version
pub fn tx_layout(ver: u8) -> Option<&'static [Field]> {
    match ver {
        0 | 1 => Some(&TX_V0_V1),
        2 => Some(&TX_V2),
        _ => None,
    }
}

/// Layout of an Rx (TRX -> L1) PDU for the given header version
pub fn rx_layout(ver: u8) -> Option<&'static [Field]> {
    match ver {
        0 => Some(&RX_V0),
        1 => Some(&RX_V1),
        2 => Some(&RX_V2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_negotiation() {
        assert_eq!(best_supported(0), Some(0));
        assert_eq!(best_supported(2), Some(2));
        assert_eq!(best_supported(7), Some(2));
        assert_eq!(best_supported(VERSION_FIELD_MAX), Some(2));

        // The suggested version is always accepted when requested again
        for ver in 0..=VERSION_FIELD_MAX {
            let suggested = best_supported(ver).unwrap();
            assert!(suggested <= ver);
            assert!(is_supported(suggested));
            assert_eq!(best_supported(suggested), Some(suggested));
        }
    }

    #[test]
    fn test_layouts_exist() {
        for ver in SUPPORTED_VERSIONS {
            assert!(tx_layout(ver).is_some());
            assert!(rx_layout(ver).is_some());
        }
        assert!(tx_layout(3).is_none());
        assert!(rx_layout(3).is_none());
    }
}
