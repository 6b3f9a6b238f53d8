//! Boolean encoding uses 1 bit per value. Each compressed byte slice contains a 1 byte header
//! indicating the compression type, followed by a variable byte encoded length indicating
//! how many booleans are packed in the slice. The remaining bytes contain 1 byte for every
//! 8 booleans encoded, most significant bit first.

use crate::engine::tsm1::codec::varint::VarInt;
use crate::engine::tsm1::codec::{Decoder, Encoder};

/// BOOLEAN_COMPRESSED_BIT_PACKED is a bit packed format using 1 bit per boolean
const BOOLEAN_COMPRESSED_BIT_PACKED: u8 = 1;

/// BooleanEncoder encodes a series of booleans to an in-memory buffer.
pub struct BooleanEncoder {
    /// The encoded bytes
    bytes: Vec<u8>,
    /// The current byte being encoded
    b: u8,
    /// The number of bools packed into b
    i: usize,
    /// The total number of bools written
    n: usize,
}

impl BooleanEncoder {
    pub fn new(sz: usize) -> Self {
        Self {
            bytes: Vec::with_capacity((sz + 7) / 8),
            b: 0,
            i: 0,
            n: 0,
        }
    }
}

impl Encoder<bool> for BooleanEncoder {
    fn write(&mut self, v: bool) {
        // If we have filled the current byte, flush it
        if self.i >= 8 {
            self.flush();
        }

        // Use 1 bit for each boolean value, filling from the most significant bit
        if v {
            self.b |= 128 >> self.i;
        }

        self.i += 1;
        self.n += 1;
    }

    /// flush appends the current byte, padded with zeros. An encoder with no values still
    /// emits one padding byte.
    fn flush(&mut self) {
        self.bytes.push(self.b);
        self.b = 0;
        self.i = 0;
    }

    fn bytes(&mut self) -> anyhow::Result<Vec<u8>> {
        self.flush();

        let mut b = Vec::with_capacity(1 + 10 + self.bytes.len());
        // Prepend the header and the number of booleans
        b.push(BOOLEAN_COMPRESSED_BIT_PACKED << 4);
        (self.n as u64).encode_var_vec(&mut b);
        b.extend_from_slice(&self.bytes);
        Ok(b)
    }
}

/// BooleanDecoder decodes a series of booleans from an in-memory buffer.
pub struct BooleanDecoder<'a> {
    b: &'a [u8],
    /// index of the next bit to read
    i: usize,
    n: usize,
    current: bool,
}

impl<'a> BooleanDecoder<'a> {
    pub fn new(b: &'a [u8]) -> anyhow::Result<Self> {
        if b.is_empty() {
            return Ok(Self {
                b,
                i: 0,
                n: 0,
                current: false,
            });
        }

        // First byte stores the encoding type, only have 1 bit-packet format
        // currently ignore for now.
        let b = &b[1..];
        let (count, n) =
            u64::decode_var(b).ok_or_else(|| anyhow!("BooleanDecoder: invalid count"))?;
        let b = &b[n..];

        // the count can not claim more bits than there are
        let n = usize::try_from(count)
            .unwrap_or(usize::MAX)
            .min(b.len().saturating_mul(8));

        Ok(Self {
            b,
            i: 0,
            n,
            current: false,
        })
    }
}

impl<'a> Decoder<bool> for BooleanDecoder<'a> {
    fn next(&mut self) -> bool {
        if self.i >= self.n {
            return false;
        }

        // Index into the byte slice
        let idx = self.i >> 3;
        // Bit position within the byte, most significant first
        let v = self.b[idx] & (128 >> (self.i & 7));
        self.current = v != 0;
        self.i += 1;
        true
    }

    fn read(&self) -> bool {
        self.current
    }

    fn err(&self) -> Option<&anyhow::Error> {
        None
    }
}
