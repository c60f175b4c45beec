use std::fmt;

use crate::pdu_parse_error::PduParseErr;

/// Big-endian bit cursor over an octet buffer, used to read and write PDUs
/// that mix bit-packed header fields with octet-aligned payloads.
pub struct BitBuffer {
    buffer: Vec<u8>,
    /// Next bit offset for read/write
    pos: usize,
    /// Bits at or after this are out of the readable window
    end: usize,
}

impl BitBuffer {
    /// Create an empty buffer for writing. It grows as bits are written.
    pub fn new_autoexpand(initial_cap_octets: usize) -> Self {
        BitBuffer {
            buffer: Vec::with_capacity(initial_cap_octets),
            pos: 0,
            end: 0,
        }
    }

    /// Wrap received octets for reading
    pub fn from_bytes(data: &[u8]) -> Self {
        BitBuffer {
            buffer: data.to_vec(),
            pos: 0,
            end: data.len() * 8,
        }
    }

    /// Read `num_bits` (up to 64) at the current pos, advancing on success.
    pub fn read_bits(&mut self, num_bits: usize) -> Option<u64> {
        if num_bits > 64 || self.pos + num_bits > self.end {
            return None;
        }
        let mut v = 0u64;
        for i in self.pos..self.pos + num_bits {
            let bit = (self.buffer[i / 8] >> (7 - i % 8)) & 1;
            v = (v << 1) | bit as u64;
        }
        self.pos += num_bits;
        Some(v)
    }

    /// Similar to read_bits, but returns a PduParseErr::BufferEnded with the given field name
    /// if not enough bits are available.
    pub fn read_field(&mut self, num_bits: usize, field: &'static str) -> Result<u64, PduParseErr> {
        self.read_bits(num_bits).ok_or(PduParseErr::BufferEnded { field: Some(field) })
    }

    /// Read `num_octets` whole octets. The position must be octet aligned.
    pub fn read_octets(&mut self, num_octets: usize, field: &'static str) -> Result<&[u8], PduParseErr> {
        debug_assert!(self.pos % 8 == 0, "read_octets at unaligned position {}", self.pos);
        if self.pos + num_octets * 8 > self.end {
            return Err(PduParseErr::BufferEnded { field: Some(field) });
        }
        let start = self.pos / 8;
        self.pos += num_octets * 8;
        Ok(&self.buffer[start..start + num_octets])
    }

    /// Skip `num_octets` without interpreting them
    pub fn skip_octets(&mut self, num_octets: usize, field: &'static str) -> Result<(), PduParseErr> {
        self.read_octets(num_octets, field).map(|_| ())
    }

    /// Write the lower `num_bits` of `value`, MSB first, advancing pos.
    pub fn write_bits(&mut self, value: u64, num_bits: usize) {
        assert!(num_bits <= 64, "can only write up to 64 bits");
        assert!(num_bits == 64 || value >> num_bits == 0, "value {} exceeds {} bits", value, num_bits);

        for i in (0..num_bits).rev() {
            let bit = ((value >> i) & 1) as u8;
            if self.pos % 8 == 0 && self.pos / 8 >= self.buffer.len() {
                self.buffer.push(0);
            }
            self.buffer[self.pos / 8] |= bit << (7 - self.pos % 8);
            self.pos += 1;
        }
        self.end = self.end.max(self.pos);
    }

    /// Append whole octets. The position must be octet aligned.
    pub fn write_octets(&mut self, data: &[u8]) {
        assert!(self.pos % 8 == 0, "write_octets at unaligned position {}", self.pos);
        self.buffer.truncate(self.pos / 8);
        self.buffer.extend_from_slice(data);
        self.pos += data.len() * 8;
        self.end = self.end.max(self.pos);
    }

    /// Append `num_octets` zero octets
    pub fn write_zero_octets(&mut self, num_octets: usize) {
        for _ in 0..num_octets {
            self.write_bits(0, 8);
        }
    }

    /// Number of bits left to read, from pos to end
    pub fn get_len_remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Number of whole octets left to read
    pub fn get_octets_remaining(&self) -> usize {
        self.get_len_remaining() / 8
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn dump_hex(&self) -> String {
        self.buffer.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitBuffer {{ pos: {}, end: {}, data: {} }}", self.pos, self.end, self.dump_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_fields_and_octets() {
        let mut bb = BitBuffer::new_autoexpand(8);
        bb.write_bits(0x2, 4); // ver
        bb.write_bits(0, 1);
        bb.write_bits(0x5, 3); // tn
        bb.write_bits(0x0102_0304, 32);
        bb.write_octets(&[0xAA, 0xBB]);
        bb.write_zero_octets(1);
        let bytes = bb.into_bytes();
        assert_eq!(bytes, vec![0x25, 0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB, 0x00]);

        let mut bb = BitBuffer::from_bytes(&bytes);
        assert_eq!(bb.read_field(4, "ver"), Ok(2));
        assert_eq!(bb.read_field(1, "rfu"), Ok(0));
        assert_eq!(bb.read_field(3, "tn"), Ok(5));
        assert_eq!(bb.read_field(32, "fn"), Ok(0x0102_0304));
        assert_eq!(bb.get_octets_remaining(), 3);
        assert_eq!(bb.read_octets(2, "burst"), Ok(&[0xAA, 0xBB][..]));
        assert_eq!(bb.read_octets(2, "pad"), Err(PduParseErr::BufferEnded { field: Some("pad") }));
    }

    #[test]
    fn test_read_overflow() {
        let mut bb = BitBuffer::from_bytes(&[0xFF]);
        assert!(bb.read_bits(9).is_none());
        assert_eq!(bb.read_bits(0), Some(0));
        assert_eq!(bb.read_bits(8), Some(0xFF));
        assert_eq!(bb.read_field(1, "x"), Err(PduParseErr::BufferEnded { field: Some("x") }));
    }
}
