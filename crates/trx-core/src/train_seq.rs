//! GMSK training sequences from 3GPP TS 45.002, section 5.2

/// Burst types carrying a GMSK training sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstType {
    /// Normal burst (5.2.3)
    Normal,
    /// Synchronization burst (5.2.5)
    Sync,
    /// Access burst (5.2.7)
    Access,
}

impl BurstType {
    /// Offset and length of the training sequence within a 148-bit burst
    fn ts_window(self) -> (usize, usize) {
        match self {
            BurstType::Normal => (3 + 57 + 1, 26),
            BurstType::Sync => (3 + 39, 64),
            BurstType::Access => (8, 41),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingSeq {
    pub tsc: u8,
    /// TSC set, counting from zero
    pub tsc_set: u8,
    pub burst_type: BurstType,
    pub seq: &'static str,
}

const fn ts(tsc: u8, burst_type: BurstType, seq: &'static str) -> TrainingSeq {
    TrainingSeq { tsc, tsc_set: 0, burst_type, seq }
}

/// Known GMSK training sequences, checked in this order
pub const TRAINING_SEQS_GMSK: [TrainingSeq; 20] = [
    // Access burst, table 5.2.7-3
    ts(0, BurstType::Access, "01001011011111111001100110101010001111000"),
    ts(1, BurstType::Access, "01010100111110001000011000101111001001101"),
    ts(2, BurstType::Access, "11101111001001110101011000001101101110111"),
    ts(4, BurstType::Access, "11001001110001001110000000001101010110010"),
    // Access burst, table 5.2.7-4
    ts(3, BurstType::Access, "10001000111010111011010000010000101100010"),
    ts(5, BurstType::Access, "01010000111111110101110101101100110010100"),
    ts(6, BurstType::Access, "01011110011101011110110100010011000010111"),
    ts(7, BurstType::Access, "01000010110000011101001010111011100010000"),
    // Synchronization burst, table 5.2.5-3
    ts(0, BurstType::Sync, "1011100101100010000001000000111100101101010001010111011000011011"),
    ts(1, BurstType::Sync, "1110111001101011001010000011111011110100011111101100101100010101"),
    ts(2, BurstType::Sync, "1110110000110111010100010101101001111000000100000010001101001110"),
    ts(3, BurstType::Sync, "1011101000111101110101101111010010001011010000001000111010011000"),
    // Normal burst, table 5.2.3a (TSC set 1)
    ts(0, BurstType::Normal, "00100101110000100010010111"),
    ts(1, BurstType::Normal, "00101101110111100010110111"),
    ts(2, BurstType::Normal, "01000011101110100100001110"),
    ts(3, BurstType::Normal, "01000111101101000100011110"),
    ts(4, BurstType::Normal, "00011010111001000001101011"),
    ts(5, BurstType::Normal, "01001110101100000100111010"),
    ts(6, BurstType::Normal, "10100111110110001010011111"),
    ts(7, BurstType::Normal, "11101111000100101110111100"),
];

impl TrainingSeq {
    /// Whether this training sequence appears at its position within `burst` (hard-bits)
    pub fn matches(&self, burst: &[u8]) -> bool {
        let (offset, len) = self.burst_type.ts_window();
        match burst.get(offset..offset + len) {
            Some(window) => window
                .iter()
                .zip(self.seq.bytes())
                .all(|(&bit, c)| bit == c - b'0'),
            None => false,
        }
    }

    /// Finds the first known training sequence contained in the given hard-bit burst
    pub fn pick(burst: &[u8]) -> Option<&'static TrainingSeq> {
        TRAINING_SEQS_GMSK.iter().find(|ts| ts.matches(burst))
    }

    /// Writes this training sequence into a burst buffer, at the position for its burst type
    pub fn fill(&self, burst: &mut [u8]) {
        let (offset, len) = self.burst_type.ts_window();
        for (dst, c) in burst[offset..offset + len].iter_mut().zip(self.seq.bytes()) {
            *dst = c - b'0';
        }
    }
}
