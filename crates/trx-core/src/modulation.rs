use core::fmt;

/// Burst length of a GMSK burst, in symbols
pub const GMSK_BURST_LEN: usize = 148;
/// Burst length of an 8-PSK (EDGE) burst, in bits
pub const EDGE_BURST_LEN: usize = GMSK_BURST_LEN * 3;

/// Modulation types defined in 3GPP TS 45.002
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modulation {
    Gmsk,
    Psk8,
    Aqpsk,
    Qam16,
    Qam32,
}

impl Modulation {
    pub const ALL: [Modulation; 5] = [
        Modulation::Gmsk,
        Modulation::Psk8,
        Modulation::Aqpsk,
        Modulation::Qam16,
        Modulation::Qam32,
    ];

    /// 4-bit modulation coding as used in the MTS field, with TSC set bits zeroed
    pub fn coding(self) -> u8 {
        match self {
            Modulation::Gmsk => 0b0000,
            Modulation::Psk8 => 0b0100,
            Modulation::Aqpsk => 0b0110,
            Modulation::Qam16 => 0b1000,
            Modulation::Qam32 => 0b1010,
        }
    }

    /// Burst length in bit units
    pub fn burst_len(self) -> usize {
        match self {
            Modulation::Gmsk => GMSK_BURST_LEN,
            Modulation::Psk8 => EDGE_BURST_LEN,
            Modulation::Aqpsk => 296,
            Modulation::Qam16 => 592,
            Modulation::Qam32 => 740,
        }
    }

    /// Number of training sequence sets available for this modulation
    pub fn num_tsc_sets(self) -> u8 {
        match self {
            Modulation::Gmsk => 4,
            _ => 2,
        }
    }

    pub fn from_coding(coding: u8) -> Option<Modulation> {
        Self::ALL.into_iter().find(|m| m.coding() == coding)
    }

    pub fn from_burst_len(len: usize) -> Option<Modulation> {
        Self::ALL.into_iter().find(|m| m.burst_len() == len)
    }

    /// Packs modulation and TSC set into the 4 middle bits of the MTS octet (unshifted)
    pub fn pack_mts_bits(self, tsc_set: u8) -> u8 {
        self.coding() | tsc_set
    }

    /// Splits the 4 middle MTS bits into modulation and TSC set.
    /// Returns None for the reserved codings `0b110x` and `0b111x`.
    pub fn unpack_mts_bits(bits: u8) -> Option<(Modulation, u8)> {
        let bits = bits & 0b1111;
        if bits & 0b1100 == 0 {
            // GMSK: 0 0 S S
            Some((Modulation::Gmsk, bits & 0b11))
        } else {
            // Others: M M M S
            Modulation::from_coding(bits & 0b1110).map(|m| (m, bits & 0b1))
        }
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modulation::Gmsk => "GMSK",
            Modulation::Psk8 => "8-PSK",
            Modulation::Aqpsk => "AQPSK",
            Modulation::Qam16 => "16QAM",
            Modulation::Qam32 => "32QAM",
        };
        f.write_str(s)
    }
}
