//! Float compression as presented in the Gorilla paper:
//! http://www.vldb.org/pvldb/vol8/p1816-teller.pdf
//!
//! A special NaN bit pattern terminates the stream, so NaN itself can not be stored.

use crate::engine::tsm1::codec::bit::{BitReader, BitWriter};
use crate::engine::tsm1::codec::{Decoder, Encoder};

/// FLOAT_COMPRESSED_GORILLA is a compressed format using the gorilla paper encoding
const FLOAT_COMPRESSED_GORILLA: u8 = 1;

/// UVNAN is the bit pattern of the end-of-stream marker.
const UVNAN: u64 = 0x7FF8000000000001;

/// FloatEncoder encodes multiple float64s into a byte slice.
pub struct FloatEncoder {
    val: u64,
    err: Option<anyhow::Error>,

    /// `u64::MAX` until the first control block is written
    leading: u64,
    trailing: u64,

    bw: BitWriter,

    first: bool,
    finished: bool,
}

impl FloatEncoder {
    pub fn new() -> Self {
        let mut bw = BitWriter::with_capacity(1024);
        bw.write_byte(FLOAT_COMPRESSED_GORILLA << 4);

        Self {
            val: 0,
            err: None,
            leading: u64::MAX,
            trailing: 0,
            bw,
            first: true,
            finished: false,
        }
    }

    fn push(&mut self, bits: u64) {
        if self.first {
            self.val = bits;
            self.first = false;
            self.bw.write_bits(bits, 64);
            return;
        }

        let delta = bits ^ self.val;
        if delta == 0 {
            self.bw.write_bit(false);
        } else {
            self.bw.write_bit(true);

            let mut leading = delta.leading_zeros() as u64;
            let trailing = delta.trailing_zeros() as u64;

            // the leading count is stored in 5 bits
            leading &= 0x1F;
            if leading >= 32 {
                leading = 31;
            }

            if self.leading != u64::MAX && leading >= self.leading && trailing >= self.trailing {
                self.bw.write_bit(false);
                self.bw.write_bits(
                    delta >> self.trailing,
                    (64 - self.leading - self.trailing) as u32,
                );
            } else {
                self.leading = leading;
                self.trailing = trailing;

                self.bw.write_bit(true);
                self.bw.write_bits(leading, 5);

                // 64 significant bits does not fit in 6 bits and is written as 0. Zero
                // significant bits never occurs since that is the delta == 0 case.
                let sigbits = 64 - leading - trailing;
                self.bw.write_bits(sigbits, 6);
                self.bw.write_bits(delta >> trailing, sigbits as u32);
            }
        }

        self.val = bits;
    }
}

impl Default for FloatEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<f64> for FloatEncoder {
    fn write(&mut self, v: f64) {
        if self.finished {
            return;
        }
        if v.is_nan() {
            self.err = Some(anyhow!("unsupported value: NaN"));
            return;
        }
        self.push(v.to_bits());
    }

    /// flush writes the end-of-stream marker. Further writes are ignored.
    fn flush(&mut self) {
        if !self.finished {
            self.push(UVNAN);
            self.finished = true;
        }
    }

    fn bytes(&mut self) -> anyhow::Result<Vec<u8>> {
        if let Some(err) = self.err.take() {
            return Err(err);
        }
        Ok(self.bw.as_slice().to_vec())
    }
}

/// FloatDecoder decodes a byte slice into multiple float64 values.
pub struct FloatDecoder<'a> {
    val: u64,

    leading: u64,
    trailing: u64,

    br: BitReader<'a>,

    first: bool,
    finished: bool,
    err: Option<anyhow::Error>,
}

impl<'a> FloatDecoder<'a> {
    pub fn new(b: &'a [u8]) -> anyhow::Result<Self> {
        let (val, br) = if b.is_empty() {
            (UVNAN, BitReader::new(b))
        } else {
            // the first byte is the compression type, gorilla is the only one
            let mut br = BitReader::new(&b[1..]);
            let val = br
                .read_bits(64)
                .map_err(|e| anyhow!("FloatDecoder: first value: {}", e))?;
            (val, br)
        };

        Ok(Self {
            val,
            leading: 0,
            trailing: 0,
            br,
            first: true,
            finished: false,
            err: None,
        })
    }

    fn advance(&mut self) -> anyhow::Result<bool> {
        if !self.br.read_bit()? {
            // same value as before
            return Ok(true);
        }

        if self.br.read_bit()? {
            self.leading = self.br.read_bits(5)?;
            let mut mbits = self.br.read_bits(6)?;
            if mbits == 0 {
                mbits = 64;
            }
            self.trailing = 64u64
                .checked_sub(self.leading + mbits)
                .ok_or_else(|| anyhow!("FloatDecoder: invalid significant bits {}", mbits))?;
        }

        let mbits = (64 - self.leading - self.trailing) as u32;
        let bits = self.br.read_bits(mbits)?;
        let v = self.val ^ (bits << self.trailing);
        if v == UVNAN {
            return Ok(false);
        }

        self.val = v;
        Ok(true)
    }
}

impl<'a> Decoder<f64> for FloatDecoder<'a> {
    fn next(&mut self) -> bool {
        if self.err.is_some() || self.finished {
            return false;
        }

        if self.first {
            self.first = false;
            // an empty block holds only the end-of-stream marker
            if self.val == UVNAN {
                self.finished = true;
                return false;
            }
            return true;
        }

        match self.advance() {
            Ok(true) => true,
            Ok(false) => {
                self.finished = true;
                false
            }
            Err(e) => {
                self.err = Some(e);
                false
            }
        }
    }

    fn read(&self) -> f64 {
        f64::from_bits(self.val)
    }

    fn err(&self) -> Option<&anyhow::Error> {
        self.err.as_ref()
    }
}
