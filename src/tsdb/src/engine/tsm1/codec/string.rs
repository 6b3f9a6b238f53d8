//! String encoding uses snappy compression to compress each string. Each string is
//! appended to byte slice prefixed with a variable byte length followed by the string
//! bytes. The bytes are compressed using snappy compressor and a 1 byte header is used
//! to indicate the type of encoding.

use crate::engine::tsm1::codec::varint::VarInt;
use crate::engine::tsm1::codec::{Decoder, Encoder};

/// STRING_COMPRESSED_SNAPPY is a compressed encoding using Snappy compression
const STRING_COMPRESSED_SNAPPY: u8 = 1;

/// StringEncoder encodes multiple strings into a byte slice.
pub struct StringEncoder {
    // The encoded bytes
    bytes: Vec<u8>,
}

impl StringEncoder {
    /// new returns a StringEncoder with an initial buffer ready to hold sz bytes.
    pub fn new(sz: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(sz),
        }
    }
}

impl<'a> Encoder<&'a [u8]> for StringEncoder {
    fn write(&mut self, s: &'a [u8]) {
        // Append the length of the string using variable byte encoding
        (s.len() as u64).encode_var_vec(&mut self.bytes);
        // Append the string bytes
        self.bytes.extend_from_slice(s);
    }

    fn flush(&mut self) {}

    fn bytes(&mut self) -> anyhow::Result<Vec<u8>> {
        let max_encoded_len = snap::raw::max_compress_len(self.bytes.len());
        if max_encoded_len == 0 {
            return Err(anyhow!("source length too large"));
        }

        let mut compressed = vec![0; max_encoded_len + 1];
        compressed[0] = STRING_COMPRESSED_SNAPPY << 4;

        let n = snap::raw::Encoder::new()
            .compress(&self.bytes, &mut compressed[1..])
            .map_err(|e| anyhow!("StringEncoder: {}", e))?;

        compressed.truncate(1 + n);
        Ok(compressed)
    }
}

/// StringDecoder decodes a byte slice into strings.
pub struct StringDecoder {
    b: Vec<u8>,
    /// offset of the next length prefix
    i: usize,

    lower: usize,
    upper: usize,

    err: Option<anyhow::Error>,
}

impl StringDecoder {
    /// new decompresses `b`. An empty slice decodes to no values.
    pub fn new(b: &[u8]) -> anyhow::Result<Self> {
        // First byte stores the encoding type, only have snappy format
        // currently so ignore for now.
        let data = match b.split_first() {
            Some((_, rest)) => snap::raw::Decoder::new()
                .decompress_vec(rest)
                .map_err(|e| anyhow!("failed to decode string block: {}", e))?,
            None => vec![],
        };

        Ok(Self {
            b: data,
            i: 0,
            lower: 0,
            upper: 0,
            err: None,
        })
    }

    fn read_range(&self) -> anyhow::Result<(usize, usize)> {
        // Read the length of the string
        let (length, n) = usize::decode_var(&self.b[self.i..])
            .ok_or_else(|| anyhow!("StringDecoder: invalid encoded string length"))?;

        // The string follows the variable byte encoded length
        let lower = self.i + n;
        let upper = lower
            .checked_add(length)
            .ok_or_else(|| anyhow!("StringDecoder: length overflow"))?;
        if upper > self.b.len() {
            return Err(anyhow!(
                "StringDecoder: not enough data to represent encoded string"
            ));
        }

        Ok((lower, upper))
    }

    /// value returns the current string without copying it.
    pub fn value(&self) -> &[u8] {
        &self.b[self.lower..self.upper]
    }
}

impl Decoder<Vec<u8>> for StringDecoder {
    fn next(&mut self) -> bool {
        if self.err.is_some() || self.i >= self.b.len() {
            return false;
        }

        match self.read_range() {
            Ok((lower, upper)) => {
                self.lower = lower;
                self.upper = upper;
                self.i = upper;
                true
            }
            Err(e) => {
                self.err = Some(e);
                false
            }
        }
    }

    fn read(&self) -> Vec<u8> {
        self.value().to_vec()
    }

    fn err(&self) -> Option<&anyhow::Error> {
        self.err.as_ref()
    }
}
