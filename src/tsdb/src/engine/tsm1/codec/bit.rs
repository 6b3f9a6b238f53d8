//! MSB-first bit streams used by the float codec.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("encountered the end of the bit stream")]
pub struct EndOfStream;

/// BitWriter appends bits to a byte buffer, most significant bit first.
/// Unused bits of the last byte are left zero.
#[derive(Debug)]
pub struct BitWriter {
    buf: Vec<u8>,
    /// bits used in the last byte, 8 means a new byte is needed
    used: u32,
}

impl BitWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            used: 8,
        }
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u64, 1);
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.write_bits(byte as u64, 8);
    }

    /// write_bits writes the low `num` bits of `bits`, highest first.
    pub fn write_bits(&mut self, bits: u64, num: u32) {
        let mut num = num.min(64);
        while num > 0 {
            if self.used == 8 {
                self.buf.push(0);
                self.used = 0;
            }

            let free = 8 - self.used;
            let take = free.min(num);
            let chunk = ((bits >> (num - take)) & ((1u64 << take) - 1)) as u8;

            let last = self.buf.len() - 1;
            self.buf[last] |= chunk << (free - take);

            self.used += take;
            num -= take;
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// BitReader reads bits from a byte slice, most significant bit first.
#[derive(Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    /// absolute bit position
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() * 8 - self.pos
    }

    pub fn read_bit(&mut self) -> Result<bool, EndOfStream> {
        self.read_bits(1).map(|b| b == 1)
    }

    /// read_bits reads `num` (at most 64) bits into the low bits of the result.
    pub fn read_bits(&mut self, num: u32) -> Result<u64, EndOfStream> {
        let mut num = num.min(64);
        if self.remaining() < num as usize {
            return Err(EndOfStream);
        }

        let mut bits = 0u64;
        while num > 0 {
            let byte = self.bytes[self.pos / 8];
            let offset = (self.pos % 8) as u32;
            let take = (8 - offset).min(num);
            let chunk = (byte << offset) >> (8 - take);

            bits = (bits << take) | chunk as u64;
            self.pos += take as usize;
            num -= take;
        }

        Ok(bits)
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;

    use crate::engine::tsm1::codec::bit::{BitReader, BitWriter, EndOfStream};

    #[test]
    fn test_write_bits_msb_first() {
        let mut w = BitWriter::with_capacity(4);
        w.write_bit(true);
        w.write_bits(0b01, 2);
        w.write_byte(0xFF);
        w.write_bits(0, 3);
        w.write_bit(true);

        // 1 01 11111111 000 1 -> 1011_1111 1110_0010
        assert_eq!(w.as_slice(), &[0b1011_1111, 0b1110_0010]);
    }

    #[test]
    fn test_write_bits_masks_high_bits() {
        let mut w = BitWriter::with_capacity(1);
        w.write_bits(64, 6);
        assert_eq!(w.into_bytes(), vec![0]);
    }

    #[test]
    fn test_read_past_end() {
        let bytes = [0xA5_u8];
        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_bits(4), Ok(0xA));
        assert_eq!(r.read_bits(5), Err(EndOfStream));
        assert_eq!(r.read_bits(4), Ok(0x5));
        assert_eq!(r.read_bit(), Err(EndOfStream));
    }

    quickcheck! {
        fn prop_bits_round_trip(fields: Vec<(u64, u8)>) -> bool {
            let fields: Vec<(u64, u32)> = fields
                .into_iter()
                .map(|(v, n)| {
                    let n = (n % 64) as u32 + 1;
                    let v = if n == 64 { v } else { v & ((1u64 << n) - 1) };
                    (v, n)
                })
                .collect();

            let mut w = BitWriter::with_capacity(64);
            for (v, n) in &fields {
                w.write_bits(*v, *n);
            }
            let bytes = w.into_bytes();

            let mut r = BitReader::new(&bytes);
            fields.iter().all(|(v, n)| r.read_bits(*n) == Ok(*v))
        }
    }
}
