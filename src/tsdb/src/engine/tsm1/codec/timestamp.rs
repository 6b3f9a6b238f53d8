//! Timestamp encoding is adaptive and based on the structure of the timestamps being encoded.
//!
//! Timestamps are delta-encoded: the first value is kept as-is, every following value is the
//! difference from its predecessor. Deltas are then scaled down by the largest power of ten
//! (at most 1e12) that divides all of them, which turns regular intervals such as 10s into
//! very small numbers.
//!
//! The scaled deltas are stored with one of three encodings, picked in this order:
//!
//! * run-length, when every delta is equal: header, first timestamp (8 bytes), the delta and
//!   the value count as varints.
//! * simple8b, when every delta fits in 60 bits: header, first timestamp (8 bytes), packed
//!   words.
//! * uncompressed otherwise: header followed by 8 bytes per value (first value then deltas).
//!
//! The 4 low bits of the header hold log10 of the scaling factor.

use bytes::BufMut;

use crate::engine::tsm1::codec::varint::VarInt;
use crate::engine::tsm1::codec::{encoding_of, read_u64_be, simple8b, Decoder, Encoder};

/// TIME_UNCOMPRESSED is an uncompressed format using 8 bytes per timestamp
const TIME_UNCOMPRESSED: u8 = 0;
/// TIME_COMPRESSED_PACKED_SIMPLE is a bit-packed format using simple8b encoding
const TIME_COMPRESSED_PACKED_SIMPLE: u8 = 1;
/// TIME_COMPRESSED_RLE is a run-length encoding format
const TIME_COMPRESSED_RLE: u8 = 2;

const MAX_DIVISOR: u64 = 1_000_000_000_000;

/// log10 of a power of ten divisor
fn divisor_exp(mut div: u64) -> u8 {
    let mut exp = 0;
    while div >= 10 {
        div /= 10;
        exp += 1;
    }
    exp
}

/// TimeEncoder encodes unix nanosecond timestamps into byte slices.
pub struct TimeEncoder {
    ts: Vec<u64>,
    enc: simple8b::Encoder,
}

impl TimeEncoder {
    pub fn new(sz: usize) -> Self {
        Self {
            ts: Vec::with_capacity(sz),
            enc: simple8b::Encoder::new(),
        }
    }

    /// reduce turns `ts` into deltas in place and returns the largest delta, the common
    /// divisor and whether all deltas are equal.
    fn reduce(&mut self) -> (u64, u64, bool) {
        let deltas = self.ts.as_mut_slice();

        let mut max = 0_u64;
        let mut divisor = MAX_DIVISOR;
        let mut rle = true;

        // walk backwards so each delta is taken against the original previous value
        for i in (1..deltas.len()).rev() {
            deltas[i] = deltas[i].wrapping_sub(deltas[i - 1]);
            let v = deltas[i];

            if v > max {
                max = v;
            }

            while divisor > 1 && v % divisor != 0 {
                divisor /= 10;
            }

            rle = i == deltas.len() - 1 || rle && deltas[i + 1] == deltas[i];
        }

        (max, divisor, rle)
    }

    fn header(encoding: u8, div: u64) -> u8 {
        encoding << 4 | divisor_exp(div)
    }

    fn encode_packed(&mut self, div: u64) -> anyhow::Result<Vec<u8>> {
        for v in &self.ts[1..] {
            self.enc.write(*v / div)?;
        }
        let deltas = self.enc.bytes()?;

        let mut b = Vec::with_capacity(1 + 8 + deltas.len());
        b.push(Self::header(TIME_COMPRESSED_PACKED_SIMPLE, div));
        b.put_u64(self.ts[0]);
        b.extend_from_slice(deltas);
        Ok(b)
    }

    fn encode_raw(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(1 + self.ts.len() * 8);
        b.push(TIME_UNCOMPRESSED << 4);
        for v in &self.ts {
            b.put_u64(*v);
        }
        b
    }

    fn encode_rle(&self, first: u64, delta: u64, div: u64) -> Vec<u8> {
        let mut b = Vec::with_capacity(1 + 8 + 2 * 10);
        b.push(Self::header(TIME_COMPRESSED_RLE, div));
        b.put_u64(first);
        (delta / div).encode_var_vec(&mut b);
        (self.ts.len() as u64).encode_var_vec(&mut b);
        b
    }
}

impl Encoder<i64> for TimeEncoder {
    fn write(&mut self, v: i64) {
        self.ts.push(v as u64);
    }

    fn flush(&mut self) {}

    fn bytes(&mut self) -> anyhow::Result<Vec<u8>> {
        if self.ts.is_empty() {
            return Ok(vec![]);
        }

        let (max, div, rle) = self.reduce();

        if rle && self.ts.len() > 1 {
            return Ok(self.encode_rle(self.ts[0], self.ts[1], div));
        }

        // deltas too large for simple8b
        if max > simple8b::MAX_VALUE {
            return Ok(self.encode_raw());
        }

        self.encode_packed(div)
    }
}

/// TimeDecoder decodes a byte slice produced by `TimeEncoder`.
pub struct TimeDecoder {
    inner: Inner,
    current: i64,
}

enum Inner {
    /// run-length: next value, delta, values left
    Rle { next: i64, delta: i64, remaining: u64 },
    /// packed and uncompressed sections are expanded on construction
    Expanded { ts: Vec<i64>, i: usize },
}

impl TimeDecoder {
    pub fn new(b: &[u8]) -> anyhow::Result<Self> {
        let inner = if b.is_empty() {
            Inner::Expanded { ts: vec![], i: 0 }
        } else {
            let div = 10_u64.pow((b[0] & 0xF) as u32);
            match encoding_of(b[0]) {
                TIME_UNCOMPRESSED => Inner::Expanded {
                    ts: decode_raw(&b[1..]),
                    i: 0,
                },
                TIME_COMPRESSED_PACKED_SIMPLE => Inner::Expanded {
                    ts: decode_packed(&b[1..], div)?,
                    i: 0,
                },
                TIME_COMPRESSED_RLE => decode_rle(&b[1..], div)?,
                encoding => return Err(anyhow!("TimeDecoder: unknown encoding {}", encoding)),
            }
        };

        Ok(Self { inner, current: 0 })
    }
}

fn decode_raw(b: &[u8]) -> Vec<i64> {
    let mut ts = Vec::with_capacity(b.len() / 8);
    let mut prev = 0_i64;
    for (i, chunk) in b.chunks_exact(8).enumerate() {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        let v = u64::from_be_bytes(word) as i64;
        prev = if i == 0 { v } else { prev.wrapping_add(v) };
        ts.push(prev);
    }
    ts
}

fn decode_packed(b: &[u8], div: u64) -> anyhow::Result<Vec<i64>> {
    let first = read_u64_be(b, 0)
        .ok_or_else(|| anyhow!("TimeDecoder: not enough data to decode packed timestamps"))?;
    let words = &b[8..];
    if words.len() % 8 != 0 {
        return Err(anyhow!(
            "TimeDecoder: invalid packed length {}",
            words.len()
        ));
    }

    let mut ts = Vec::with_capacity(1 + words.len() / 8 * 8);
    let mut last = first as i64;
    ts.push(last);

    let mut buf = [0u64; simple8b::MAX_PACKED];
    for chunk in words.chunks_exact(8) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        let n = simple8b::decode(&mut buf, u64::from_be_bytes(word));
        for delta in &buf[..n] {
            last = last.wrapping_add(delta.wrapping_mul(div) as i64);
            ts.push(last);
        }
    }

    Ok(ts)
}

fn decode_rle(b: &[u8], div: u64) -> anyhow::Result<Inner> {
    let first = read_u64_be(b, 0)
        .ok_or_else(|| anyhow!("TimeDecoder: not enough data to decode RLE starting value"))?;
    let mut i = 8;

    let (delta, n) = u64::decode_var(&b[i..])
        .ok_or_else(|| anyhow!("TimeDecoder: invalid run length in decodeRLE"))?;
    i += n;

    let (count, _) = u64::decode_var(&b[i..])
        .ok_or_else(|| anyhow!("TimeDecoder: invalid repeat value in decodeRLE"))?;

    Ok(Inner::Rle {
        next: first as i64,
        delta: delta.wrapping_mul(div) as i64,
        remaining: count,
    })
}

impl Decoder<i64> for TimeDecoder {
    fn next(&mut self) -> bool {
        match &mut self.inner {
            Inner::Rle {
                next,
                delta,
                remaining,
            } => {
                if *remaining == 0 {
                    return false;
                }
                self.current = *next;
                *next = next.wrapping_add(*delta);
                *remaining -= 1;
                true
            }
            Inner::Expanded { ts, i } => match ts.get(*i) {
                Some(v) => {
                    self.current = *v;
                    *i += 1;
                    true
                }
                None => false,
            },
        }
    }

    fn read(&self) -> i64 {
        self.current
    }

    fn err(&self) -> Option<&anyhow::Error> {
        None
    }
}

/// count_timestamps returns the number of timestamps in an encoded section without decoding it.
pub fn count_timestamps(b: &[u8]) -> anyhow::Result<usize> {
    if b.is_empty() {
        return Err(anyhow!("count_timestamps: no data found"));
    }

    match encoding_of(b[0]) {
        // Uncompressed timestamps are just 8 bytes each
        TIME_UNCOMPRESSED => Ok((b.len() - 1) / 8),
        TIME_COMPRESSED_RLE => {
            if b.len() < 9 {
                return Err(anyhow!("count_timestamps: short RLE section"));
            }
            // skip the header byte and starting timestamp
            let mut i = 9;
            let (_, n) = u64::decode_var(&b[i..])
                .ok_or_else(|| anyhow!("count_timestamps: can not decode delta"))?;
            i += n;
            let (count, _) = u64::decode_var(&b[i..])
                .ok_or_else(|| anyhow!("count_timestamps: can not decode repeat"))?;
            Ok(count as usize)
        }
        TIME_COMPRESSED_PACKED_SIMPLE => {
            if b.len() < 9 {
                return Err(anyhow!("count_timestamps: short packed section"));
            }
            // +1 for the starting timestamp stored before the packed words
            Ok(simple8b::count_bytes(&b[9..])? + 1)
        }
        encoding => Err(anyhow!(
            "count_timestamps: unsupported encoding {}",
            encoding
        )),
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;
    use rand::Rng;

    use crate::engine::tsm1::codec::timestamp::{
        count_timestamps, TimeDecoder, TimeEncoder, TIME_COMPRESSED_PACKED_SIMPLE,
        TIME_COMPRESSED_RLE, TIME_UNCOMPRESSED,
    };
    use crate::engine::tsm1::codec::{Decoder, Encoder};

    const SECOND: i64 = 1_000_000_000;

    fn encode(values: &[i64]) -> Vec<u8> {
        let mut enc = TimeEncoder::new(values.len());
        for v in values {
            enc.write(*v);
        }
        enc.bytes().unwrap()
    }

    fn decode(b: &[u8]) -> Vec<i64> {
        let mut dec = TimeDecoder::new(b).unwrap();
        let mut got = vec![];
        while dec.next() {
            got.push(dec.read());
        }
        got
    }

    #[test]
    fn test_time_encoder() {
        let x: Vec<i64> = (0..4).map(|i| i * SECOND).collect();
        let b = encode(&x);

        assert_eq!(b[0] >> 4, TIME_COMPRESSED_RLE, "Wrong encoding used");
        assert_eq!(decode(&b), x);
        assert_eq!(count_timestamps(&b).unwrap(), x.len());
    }

    #[test]
    fn test_time_encoder_no_values() {
        let b = encode(&[]);
        assert!(b.is_empty());

        let mut dec = TimeDecoder::new(&b).unwrap();
        assert!(!dec.next(), "unexpected next value: got true, exp false");
    }

    #[test]
    fn test_time_encoder_one() {
        let b = encode(&[0]);
        assert_eq!(b[0] >> 4, TIME_COMPRESSED_PACKED_SIMPLE);
        // a single value keeps the initial 1e12 divisor
        assert_eq!(b, vec![0x1C, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decode(&b), vec![0]);
        assert_eq!(count_timestamps(&b).unwrap(), 1);
    }

    #[test]
    fn test_time_encoder_two() {
        let b = encode(&[0, 1]);
        assert_eq!(b[0] >> 4, TIME_COMPRESSED_RLE);
        assert_eq!(decode(&b), vec![0, 1]);
    }

    #[test]
    fn test_time_encoder_three() {
        let x = vec![0, 1, 3];
        let b = encode(&x);
        assert_eq!(b[0] >> 4, TIME_COMPRESSED_PACKED_SIMPLE);
        assert_eq!(decode(&b), x);
        assert_eq!(count_timestamps(&b).unwrap(), 3);
    }

    #[test]
    fn test_time_encoder_large_range() {
        let x = vec![1442369134000000000, 1442369135000000000];
        let b = encode(&x);
        assert_eq!(b[0] >> 4, TIME_COMPRESSED_RLE);
        assert_eq!(decode(&b), x);
    }

    #[test]
    fn test_time_encoder_raw() {
        let x = vec![0, 1, 1 << 62];
        let b = encode(&x);
        assert_eq!(b[0] >> 4, TIME_UNCOMPRESSED);
        assert_eq!(b.len(), 1 + 3 * 8);
        assert_eq!(decode(&b), x);
        assert_eq!(count_timestamps(&b).unwrap(), 3);
    }

    #[test]
    fn test_time_encoder_reverse() {
        let x = vec![3, 2, 0];
        let b = encode(&x);
        assert_eq!(b[0] >> 4, TIME_UNCOMPRESSED);
        assert_eq!(decode(&b), x);
    }

    #[test]
    fn test_time_encoder_negative() {
        let x = vec![-3 * SECOND, -2 * SECOND, SECOND];
        assert_eq!(decode(&encode(&x)), x);
    }

    #[test]
    fn test_time_encoder_220_second_delta() {
        let x: Vec<i64> = (0..220).map(|i| i * SECOND).collect();
        let b = encode(&x);

        // regular intervals collapse to a few bytes of RLE
        assert!(b.len() <= 12, "unexpected length: {}", b.len());
        assert_eq!(b[0] >> 4, TIME_COMPRESSED_RLE);
        assert_eq!(b[0] & 0xF, 9, "divisor should be 1e9");
        assert_eq!(decode(&b), x);
        assert_eq!(count_timestamps(&b).unwrap(), 220);
    }

    #[test]
    fn test_time_encoder_packed_divisor() {
        let x: Vec<i64> = vec![0, 10 * SECOND, 30 * SECOND, 60 * SECOND, 61 * SECOND];
        let b = encode(&x);
        assert_eq!(b[0] >> 4, TIME_COMPRESSED_PACKED_SIMPLE);
        assert_eq!(b[0] & 0xF, 9);
        assert_eq!(decode(&b), x);
        assert_eq!(count_timestamps(&b).unwrap(), x.len());
    }

    #[test]
    fn test_time_encoder_random() {
        let mut rng = rand::thread_rng();
        let mut t = 1_600_000_000 * SECOND;
        let mut x = Vec::with_capacity(1000);
        for _ in 0..1000 {
            t += rng.gen_range(1..10 * SECOND);
            x.push(t);
        }
        let b = encode(&x);
        assert_eq!(decode(&b), x);
        assert_eq!(count_timestamps(&b).unwrap(), x.len());
    }

    #[test]
    fn test_time_decoder_corrupt() {
        assert!(TimeDecoder::new(&[0x10, 0, 0]).is_err());
        assert!(TimeDecoder::new(&[0x20, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
        assert!(TimeDecoder::new(&[0x30]).is_err());
        assert!(count_timestamps(&[]).is_err());
        assert!(count_timestamps(&[0x10, 0, 0]).is_err());
    }

    quickcheck! {
        fn prop_time_round_trip(values: Vec<i64>) -> bool {
            let b = encode(&values);
            let counted = if values.is_empty() { 0 } else { count_timestamps(&b).unwrap() };
            decode(&b) == values && counted == values.len()
        }

        fn prop_sorted_time_round_trip(values: Vec<u32>) -> bool {
            let mut values: Vec<i64> = values.into_iter().map(|v| v as i64 * 1000).collect();
            values.sort();
            decode(&encode(&values)) == values
        }
    }
}
