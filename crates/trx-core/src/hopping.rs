//! Hopping sequence generation as per 3GPP TS 45.002, section 6.2.3

use core::fmt;

use crate::FreqHz;
use crate::gsm_time::GsmTime;

/// Pseudo-random number table for hopping sequence generation (TS 45.002, table 6.2.3-1)
const RNTABLE: [u8; 114] = [
     48,  98,  63,   1,  36,  95,  78, 102,  94,  73,
      0,  64,  25,  81,  76,  59, 124,  23, 104, 100,
    101,  47, 118,  85,  18,  56,  96,  86,  54,   2,
     80,  34, 127,  13,   6,  89,  57, 103,  12,  74,
     55, 111,  75,  38, 109,  71, 112,  29,  11,  88,
     87,  19,   3,  68, 110,  26,  33,  31,   8,  45,
     82,  58,  40, 107,  32,   5, 106,  92,  62,  67,
     77, 108, 122,  37,  60,  66, 121,  42,  51, 126,
    117, 114,   4,  90,  43,  52,  53, 113, 120,  72,
     16,  49,   7,  79, 119,  61,  22,  84,   9,  97,
     91,  15,  21,  24,  46,  39,  93, 105,  65,  70,
    125,  99,  17, 123,
];

/// Highest valid Hopping Sequence Number
pub const HSN_MAX: u8 = 63;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoppingError {
    EmptyMobileAllocation,
    InvalidHsn(u8),
}

impl fmt::Display for HoppingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoppingError::EmptyMobileAllocation => write!(f, "Mobile Allocation is empty"),
            HoppingError::InvalidHsn(hsn) => write!(f, "HSN {} is out of range 0..{}", hsn, HSN_MAX),
        }
    }
}

impl std::error::Error for HoppingError {}

/// Frequency hopping parameters: HSN, MAIO and the Mobile Allocation
/// as a list of (Rx, Tx) frequency pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoppingParams {
    hsn: u8,
    maio: u8,
    ma: Vec<(FreqHz, FreqHz)>,
    /// 2 ^ NBIN - 1, where NBIN is the number of bits needed to represent len(MA)
    pnm: u32,
}

impl HoppingParams {
    pub fn new(hsn: u8, maio: u8, ma: Vec<(FreqHz, FreqHz)>) -> Result<Self, HoppingError> {
        if ma.is_empty() {
            return Err(HoppingError::EmptyMobileAllocation);
        }
        if hsn > HSN_MAX {
            return Err(HoppingError::InvalidHsn(hsn));
        }

        let n = ma.len() as u32;
        let pnm = n | (n >> 1) | (n >> 2) | (n >> 3) | (n >> 4) | (n >> 5) | (n >> 6);

        Ok(Self { hsn, maio, ma, pnm })
    }

    pub fn hsn(&self) -> u8 {
        self.hsn
    }

    pub fn maio(&self) -> u8 {
        self.maio
    }

    pub fn ma(&self) -> &[(FreqHz, FreqHz)] {
        &self.ma
    }

    /// Mobile Allocation Index (MAI) for the given TDMA frame number
    pub fn ma_index(&self, fn_num: u32) -> usize {
        let n = self.ma.len() as u32;
        let maio = self.maio as u32;

        // Cyclic hopping
        if self.hsn == 0 {
            return ((fn_num + maio) % n) as usize;
        }

        // Pseudo random hopping
        let t = GsmTime::from_fn(fn_num);
        let rn_idx = ((self.hsn as u32 ^ (t.t1 & 63)) + t.t3) as usize;
        let m = t.t2 + RNTABLE[rn_idx] as u32;
        let mp = m & self.pnm;
        let tp = t.t3 & self.pnm;

        let s = if mp < n { mp } else { (mp + tp) % n };
        ((s + maio) % n) as usize
    }

    /// Resolves the (Rx, Tx) frequency pair for the given TDMA frame number
    pub fn resolve(&self, fn_num: u32) -> (FreqHz, FreqHz) {
        self.ma[self.ma_index(fn_num)]
    }
}

impl fmt::Display for HoppingParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsn={}, maio={}, ma_len={}", self.hsn, self.maio, self.ma.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsm_time::GSM_HYPERFRAME;

    fn ma(n: usize) -> Vec<(FreqHz, FreqHz)> {
        (0..n as u64).map(|i| (900_000_000 + i * 200_000, 945_000_000 + i * 200_000)).collect()
    }

    fn indices(hp: &HoppingParams, fns: std::ops::Range<u32>) -> Vec<usize> {
        fns.map(|f| hp.ma_index(f)).collect()
    }

    #[test]
    fn test_rejects_invalid_params() {
        assert_eq!(HoppingParams::new(5, 0, vec![]), Err(HoppingError::EmptyMobileAllocation));
        assert_eq!(HoppingParams::new(64, 0, ma(2)), Err(HoppingError::InvalidHsn(64)));
        assert!(HoppingParams::new(63, 0, ma(2)).is_ok());
    }

    #[test]
    fn test_pnm() {
        // pnm must equal 2 ^ NBIN - 1 for every supported MA length
        for n in 1..=64usize {
            let hp = HoppingParams::new(1, 0, ma(n)).unwrap();
            let nbin = usize::BITS - n.leading_zeros();
            assert_eq!(hp.pnm, (1 << nbin) - 1, "n={}", n);
        }
    }

    #[test]
    fn test_cyclic_hopping() {
        let hp = HoppingParams::new(0, 2, ma(3)).unwrap();
        assert_eq!(indices(&hp, 0..7), vec![2, 0, 1, 2, 0, 1, 2]);
        // Period equals the MA length
        for f in 0..1000 {
            assert_eq!(hp.resolve(f), hp.resolve(f + 3));
        }
    }

    #[test]
    fn test_pseudo_random_reference_vectors() {
        // Reference MAI sequences generated with the TS 45.002 6.2.3 algorithm
        let hp = HoppingParams::new(5, 0, ma(4)).unwrap();
        assert_eq!(indices(&hp, 0..16), vec![3, 0, 0, 1, 1, 2, 0, 0, 1, 2, 3, 2, 3, 2, 2, 3]);

        let hp = HoppingParams::new(63, 1, ma(5)).unwrap();
        assert_eq!(indices(&hp, 2_715_000..2_715_012), vec![3, 3, 4, 3, 3, 0, 3, 4, 0, 1, 0, 3]);

        let hp = HoppingParams::new(1, 2, ma(3)).unwrap();
        assert_eq!(indices(&hp, 9282..9294), vec![1, 0, 2, 2, 2, 0, 1, 2, 2, 2, 1, 1]);
    }

    #[test]
    fn test_setfh_scenario() {
        // hsn=5, maio=3, two channels: pseudo random branch, not the cyclic one
        let ma = vec![(9_000_000, 9_002_000), (9_100_000, 9_102_000)];
        let hp = HoppingParams::new(5, 3, ma.clone()).unwrap();
        let expected = [0, 1, 1, 0, 0, 0, 1, 1, 0, 0, 0, 1, 0, 0, 1, 1];
        for (f, &mai) in expected.iter().enumerate() {
            assert_eq!(hp.resolve(f as u32), ma[mai], "fn={}", f);
        }

        let cyclic = HoppingParams::new(0, 3, ma).unwrap();
        let differs = (0..16).any(|f| cyclic.ma_index(f) != hp.ma_index(f));
        assert!(differs);
    }

    #[test]
    fn test_deterministic_over_hyperframe() {
        let hp = HoppingParams::new(42, 7, ma(11)).unwrap();
        let hp2 = hp.clone();
        for f in (0..GSM_HYPERFRAME).step_by(997) {
            let mai = hp.ma_index(f);
            assert!(mai < 11);
            assert_eq!(mai, hp2.ma_index(f));
        }
    }
}
