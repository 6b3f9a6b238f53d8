//! Unsigned values share the integer encoding, reinterpreting the bits as i64.

use crate::engine::tsm1::codec::integer::{IntegerDecoder, IntegerEncoder};
use crate::engine::tsm1::codec::{Decoder, Encoder};

pub struct UnsignedEncoder(IntegerEncoder);

impl UnsignedEncoder {
    pub fn new(sz: usize) -> Self {
        Self(IntegerEncoder::new(sz))
    }
}

impl Encoder<u64> for UnsignedEncoder {
    fn write(&mut self, v: u64) {
        self.0.write(v as i64);
    }

    fn flush(&mut self) {
        self.0.flush();
    }

    fn bytes(&mut self) -> anyhow::Result<Vec<u8>> {
        self.0.bytes()
    }
}

pub struct UnsignedDecoder<'a>(IntegerDecoder<'a>);

impl<'a> UnsignedDecoder<'a> {
    pub fn new(b: &'a [u8]) -> anyhow::Result<Self> {
        Ok(Self(IntegerDecoder::new(b)?))
    }
}

impl<'a> Decoder<u64> for UnsignedDecoder<'a> {
    fn next(&mut self) -> bool {
        self.0.next()
    }

    fn read(&self) -> u64 {
        self.0.read() as u64
    }

    fn err(&self) -> Option<&anyhow::Error> {
        self.0.err()
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::tsm1::codec::unsigned::{UnsignedDecoder, UnsignedEncoder};
    use crate::engine::tsm1::codec::{Decoder, Encoder};

    #[test]
    fn test_unsigned_round_trip() {
        let values = vec![0, 1, u64::MAX, u64::MAX / 2, 42, 42, 42];

        let mut enc = UnsignedEncoder::new(values.len());
        for v in &values {
            enc.write(*v);
        }
        let b = enc.bytes().unwrap();

        let mut dec = UnsignedDecoder::new(&b).unwrap();
        let mut got = vec![];
        while dec.next() {
            got.push(dec.read());
        }
        assert!(dec.err().is_none());
        assert_eq!(got, values);
    }
}
