//! Integer encoding delta-encodes the values and maps the deltas through zig zag encoding,
//! so [-2,-1,0,1] becomes [3,1,0,2].
//!
//! The deltas are then stored run-length encoded when they are all equal, packed with simple8b
//! when they all fit in 60 bits, or uncompressed with 8 bytes each. All multi-byte values are
//! big endian.

use bytes::BufMut;

use crate::engine::tsm1::codec::varint::VarInt;
use crate::engine::tsm1::codec::zigzag::{zig_zag_decode, zig_zag_encode};
use crate::engine::tsm1::codec::{encoding_of, read_u64_be, simple8b, Decoder, Encoder};

/// INT_UNCOMPRESSED is an uncompressed format using 8 bytes per point
const INT_UNCOMPRESSED: u8 = 0;
/// INT_COMPRESSED_SIMPLE is a bit-packed format using simple8b encoding
const INT_COMPRESSED_SIMPLE: u8 = 1;
/// INT_COMPRESSED_RLE is a run-length encoding format
const INT_COMPRESSED_RLE: u8 = 2;

/// IntegerEncoder encodes int64s into byte slices.
pub struct IntegerEncoder {
    prev: i64,
    rle: bool,
    values: Vec<u64>,
}

impl IntegerEncoder {
    pub fn new(sz: usize) -> Self {
        Self {
            prev: 0,
            rle: true,
            values: Vec::with_capacity(sz),
        }
    }

    fn encode_rle(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(1 + 8 + 2 * 10);
        b.put_u8(INT_COMPRESSED_RLE << 4);
        // The first value
        b.put_u64(self.values[0]);
        // The first delta
        self.values[1].encode_var_vec(&mut b);
        // The number of times the delta is repeated
        ((self.values.len() - 1) as u64).encode_var_vec(&mut b);
        b
    }

    fn encode_packed(&self) -> anyhow::Result<Vec<u8>> {
        if self.values.is_empty() {
            return Ok(vec![]);
        }

        // the first value is written unencoded
        let mut rest = self.values[1..].to_vec();
        let n = simple8b::encode_all(&mut rest)?;

        let mut b = Vec::with_capacity(1 + (n + 1) * 8);
        b.put_u8(INT_COMPRESSED_SIMPLE << 4);
        b.put_u64(self.values[0]);
        for v in &rest[..n] {
            b.put_u64(*v);
        }
        Ok(b)
    }

    fn encode_uncompressed(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(1 + self.values.len() * 8);
        b.put_u8(INT_UNCOMPRESSED << 4);
        for v in &self.values {
            b.put_u64(*v);
        }
        b
    }
}

impl Encoder<i64> for IntegerEncoder {
    fn write(&mut self, v: i64) {
        // delta first, the deltas may be negative
        let delta = v.wrapping_sub(self.prev);
        self.prev = v;
        let enc = zig_zag_encode(delta);
        if self.values.len() > 1 {
            self.rle = self.rle && self.values[self.values.len() - 1] == enc;
        }

        self.values.push(enc);
    }

    fn flush(&mut self) {}

    fn bytes(&mut self) -> anyhow::Result<Vec<u8>> {
        // Only run-length encode if it could reduce storage size.
        if self.rle && self.values.len() > 2 {
            return Ok(self.encode_rle());
        }

        if self.values.iter().any(|v| *v > simple8b::MAX_VALUE) {
            return Ok(self.encode_uncompressed());
        }

        self.encode_packed()
    }
}

/// IntegerDecoder decodes a byte slice into int64s.
pub struct IntegerDecoder<'a> {
    encoding: u8,
    bytes: &'a [u8],

    /// values of the current simple8b word or uncompressed value
    values: [u64; simple8b::MAX_PACKED],
    i: usize,
    n: usize,

    first: bool,
    prev: i64,
    current: i64,

    rle_first: u64,
    rle_delta: u64,

    err: Option<anyhow::Error>,
}

impl<'a> IntegerDecoder<'a> {
    pub fn new(b: &'a [u8]) -> anyhow::Result<Self> {
        let (encoding, bytes) = match b.split_first() {
            Some((header, rest)) => (encoding_of(*header), rest),
            None => (INT_UNCOMPRESSED, b),
        };

        match encoding {
            INT_UNCOMPRESSED | INT_COMPRESSED_SIMPLE | INT_COMPRESSED_RLE => {}
            _ => return Err(anyhow!("IntegerDecoder: unknown encoding {}", encoding)),
        }

        Ok(Self {
            encoding,
            bytes,
            values: [0; simple8b::MAX_PACKED],
            i: 0,
            n: 0,
            first: true,
            prev: 0,
            current: 0,
            rle_first: 0,
            rle_delta: 0,
            err: None,
        })
    }

    fn take_word(&mut self, what: &str) -> Option<u64> {
        if self.bytes.is_empty() {
            return None;
        }
        match read_u64_be(self.bytes, 0) {
            Some(v) => {
                self.bytes = &self.bytes[8..];
                Some(v)
            }
            None => {
                self.err = Some(anyhow!(
                    "IntegerDecoder: not enough data to decode {} value",
                    what
                ));
                None
            }
        }
    }

    fn decode_rle(&mut self) {
        let first = match self.take_word("RLE starting") {
            Some(v) => v,
            None => return,
        };

        let Some((delta, n)) = u64::decode_var(self.bytes) else {
            self.err = Some(anyhow!("IntegerDecoder: invalid RLE delta value"));
            return;
        };
        let Some((count, _)) = u64::decode_var(&self.bytes[n..]) else {
            self.err = Some(anyhow!("IntegerDecoder: invalid RLE repeat value"));
            return;
        };

        self.rle_first = first;
        self.rle_delta = delta;
        self.n = (count as usize).saturating_add(1);
        self.i = 0;
        // all bytes consumed
        self.bytes = &[];
    }

    fn decode_packed(&mut self) {
        let Some(v) = self.take_word("packed") else {
            return;
        };

        if self.first {
            self.first = false;
            self.values[0] = v;
            self.n = 1;
        } else {
            self.n = simple8b::decode(&mut self.values, v);
        }
        self.i = 0;
    }

    fn decode_uncompressed(&mut self) {
        let Some(v) = self.take_word("uncompressed") else {
            return;
        };
        self.values[0] = v;
        self.n = 1;
        self.i = 0;
    }
}

impl<'a> Decoder<i64> for IntegerDecoder<'a> {
    fn next(&mut self) -> bool {
        if self.err.is_some() {
            return false;
        }
        if self.i >= self.n && self.bytes.is_empty() {
            return false;
        }

        self.i += 1;
        if self.i >= self.n {
            match self.encoding {
                INT_UNCOMPRESSED => self.decode_uncompressed(),
                INT_COMPRESSED_SIMPLE => self.decode_packed(),
                _ => self.decode_rle(),
            }
        }

        if self.err.is_some() || self.i >= self.n {
            return false;
        }

        self.current = if self.encoding == INT_COMPRESSED_RLE {
            zig_zag_decode(self.rle_first)
                .wrapping_add((self.i as i64).wrapping_mul(zig_zag_decode(self.rle_delta)))
        } else {
            let v = zig_zag_decode(self.values[self.i]).wrapping_add(self.prev);
            self.prev = v;
            v
        };
        true
    }

    fn read(&self) -> i64 {
        self.current
    }

    fn err(&self) -> Option<&anyhow::Error> {
        self.err.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;
    use rand::Rng;

    use crate::engine::tsm1::codec::integer::{
        IntegerDecoder, IntegerEncoder, INT_COMPRESSED_RLE, INT_COMPRESSED_SIMPLE,
        INT_UNCOMPRESSED,
    };
    use crate::engine::tsm1::codec::{Decoder, Encoder};

    fn encode(values: &[i64]) -> Vec<u8> {
        let mut enc = IntegerEncoder::new(values.len());
        for v in values {
            enc.write(*v);
        }
        enc.bytes().unwrap()
    }

    fn decode(b: &[u8]) -> Vec<i64> {
        let mut dec = IntegerDecoder::new(b).unwrap();
        let mut got = vec![];
        while dec.next() {
            got.push(dec.read());
        }
        assert!(dec.err().is_none(), "unexpected error: {:?}", dec.err());
        got
    }

    #[test]
    fn test_integer_encoder_no_values() {
        let b = encode(&[]);
        assert!(b.is_empty());
        assert!(decode(&b).is_empty());
    }

    #[test]
    fn test_integer_encoder_one() {
        let b = encode(&[1]);
        assert_eq!(b[0] >> 4, INT_COMPRESSED_SIMPLE);
        // zig zag of 1 is 2, stored big endian
        assert_eq!(b, vec![0x10, 0, 0, 0, 0, 0, 0, 0, 2]);
        assert_eq!(decode(&b), vec![1]);
    }

    #[test]
    fn test_integer_encoder_two() {
        let x = vec![1, 2];
        let b = encode(&x);
        assert_eq!(b[0] >> 4, INT_COMPRESSED_SIMPLE);
        assert_eq!(decode(&b), x);
    }

    #[test]
    fn test_integer_encoder_negative() {
        let x = vec![-2, 0, 1];
        let b = encode(&x);
        assert_eq!(b[0] >> 4, INT_COMPRESSED_SIMPLE);
        assert_eq!(decode(&b), x);
    }

    #[test]
    fn test_integer_encoder_large_values() {
        let x = vec![i64::MAX, i64::MIN, 0, -1, i64::MAX];
        let b = encode(&x);
        assert_eq!(b[0] >> 4, INT_UNCOMPRESSED);
        assert_eq!(b.len(), 1 + 8 * x.len());
        assert_eq!(decode(&b), x);
    }

    #[test]
    fn test_integer_encoder_rle() {
        let x: Vec<i64> = (0..100).map(|i| 5 + i * 10).collect();
        let b = encode(&x);
        assert_eq!(b[0] >> 4, INT_COMPRESSED_RLE);
        // header, first value, delta and count varints
        assert_eq!(b.len(), 1 + 8 + 1 + 1);
        assert_eq!(decode(&b), x);
    }

    #[test]
    fn test_integer_encoder_rle_negative_delta() {
        let x = vec![10, 7, 4, 1, -2];
        let b = encode(&x);
        assert_eq!(b[0] >> 4, INT_COMPRESSED_RLE);
        assert_eq!(decode(&b), x);
    }

    #[test]
    fn test_integer_encoder_constant() {
        let x = vec![42; 300];
        let b = encode(&x);
        assert_eq!(b[0] >> 4, INT_COMPRESSED_RLE);
        assert_eq!(decode(&b), x);
    }

    #[test]
    fn test_integer_encoder_run_of_ones() {
        // deltas of -1 zig zag to 1 and pack into the 240/120 run selectors
        let mut x: Vec<i64> = (0..400).map(|i| 400 - i).collect();
        x.push(1000);
        let b = encode(&x);
        assert_eq!(b[0] >> 4, INT_COMPRESSED_SIMPLE);
        assert_eq!(decode(&b), x);
    }

    #[test]
    fn test_integer_encoder_random() {
        let mut rng = rand::thread_rng();
        let x: Vec<i64> = (0..1000).map(|_| rng.gen_range(-1_000_000..1_000_000)).collect();
        assert_eq!(decode(&encode(&x)), x);
    }

    #[test]
    fn test_integer_decoder_corrupt() {
        assert!(IntegerDecoder::new(&[0x30]).is_err());

        let mut dec = IntegerDecoder::new(&[0x10, 0, 0, 0]).unwrap();
        assert!(!dec.next());
        assert!(dec.err().is_some());

        let mut dec = IntegerDecoder::new(&[0x20, 0, 0, 0, 0, 0, 0, 0, 2]).unwrap();
        assert!(!dec.next());
        assert!(dec.err().is_some());
    }

    quickcheck! {
        fn prop_integer_round_trip(values: Vec<i64>) -> bool {
            let mut dec_values = vec![];
            let b = encode(&values);
            let mut dec = IntegerDecoder::new(&b).unwrap();
            while dec.next() {
                dec_values.push(dec.read());
            }
            dec.err().is_none() && dec_values == values
        }
    }
}
