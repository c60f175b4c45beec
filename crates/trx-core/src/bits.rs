//! Conversion between hard-bits, signed soft-bits and unsigned soft-bits.
//!
//! Hard-bits are `0` or `1`. Signed soft-bits range from `-127` (certain 1)
//! to `127` (certain 0). Unsigned soft-bits, as carried by TRXD v0, range from
//! `0` (certain 0) to `254` (certain 1), with `255` accepted as an alias of `254`.
//!
//! The unsigned/signed round trip is lossless except for `255`, which decodes
//! to `-127` and therefore re-encodes as `254`.

/// Unsigned soft-bit to signed soft-bit
#[inline(always)]
pub fn usbit2sbit(usbit: u8) -> i8 {
    if usbit == 255 {
        -127
    } else {
        (127 - usbit as i16) as i8
    }
}

/// Signed soft-bit to unsigned soft-bit. Never produces `255`.
#[inline(always)]
pub fn sbit2usbit(sbit: i8) -> u8 {
    (127 - sbit.max(-127) as i16) as u8
}

/// Signed soft-bit to hard-bit
#[inline(always)]
pub fn sbit2ubit(sbit: i8) -> u8 {
    if sbit < 0 { 1 } else { 0 }
}

/// Hard-bit to signed soft-bit
#[inline(always)]
pub fn ubit2sbit(ubit: u8) -> i8 {
    if ubit != 0 { -127 } else { 127 }
}

pub fn usbits2sbits(bits: &[u8]) -> Vec<i8> {
    bits.iter().map(|&b| usbit2sbit(b)).collect()
}

pub fn sbits2usbits(bits: &[i8]) -> Vec<u8> {
    bits.iter().map(|&b| sbit2usbit(b)).collect()
}

pub fn sbits2ubits(bits: &[i8]) -> Vec<u8> {
    bits.iter().map(|&b| sbit2ubit(b)).collect()
}

pub fn ubits2sbits(bits: &[u8]) -> Vec<i8> {
    bits.iter().map(|&b| ubit2sbit(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_bit_round_trip() {
        for b in 0..=1u8 {
            assert_eq!(sbit2ubit(ubit2sbit(b)), b);
        }
        assert_eq!(ubit2sbit(1), -127);
        assert_eq!(ubit2sbit(0), 127);
    }

    #[test]
    fn test_usbit_sbit_inverse() {
        for us in 0..=254u8 {
            assert_eq!(sbit2usbit(usbit2sbit(us)), us, "usbit {}", us);
        }
        for s in -127..=127i8 {
            assert_eq!(usbit2sbit(sbit2usbit(s)), s, "sbit {}", s);
        }
    }

    #[test]
    fn test_usbit_lossy_point() {
        // 255 is an alias of 254 and cannot be reproduced
        assert_eq!(usbit2sbit(255), -127);
        assert_eq!(sbit2usbit(-127), 254);
        assert_eq!(sbit2usbit(127), 0);
        // -128 saturates the same way
        assert_eq!(sbit2usbit(-128), 254);
    }

    #[test]
    fn test_slice_helpers() {
        let ubits = vec![0, 1, 1, 0];
        let sbits = ubits2sbits(&ubits);
        assert_eq!(sbits, vec![127, -127, -127, 127]);
        assert_eq!(sbits2ubits(&sbits), ubits);
        assert_eq!(usbits2sbits(&sbits2usbits(&sbits)), sbits);
    }
}
