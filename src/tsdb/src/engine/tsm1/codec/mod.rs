//! Value and timestamp codecs used inside TSM blocks.
//!
//! Every encoded section starts with a one byte header. The 4 high bits hold the
//! encoding type, the 4 low bits are free for the encoding to use.

pub mod bit;
pub mod simple8b;
pub mod varint;
pub mod zigzag;

pub mod boolean;
pub mod float;
pub mod integer;
pub mod string;
pub mod timestamp;
pub mod unsigned;

pub trait Encoder<T> {
    fn write(&mut self, v: T);
    fn flush(&mut self);
    fn bytes(&mut self) -> anyhow::Result<Vec<u8>>;
}

/// Decoder is a cursor over an encoded section. `next` advances and reports whether a value
/// is available, `read` returns it without side effects.
pub trait Decoder<T> {
    fn next(&mut self) -> bool;
    fn read(&self) -> T;
    fn err(&self) -> Option<&anyhow::Error>;
}

/// encoding_of returns the encoding type stored in the 4 high bits of a section header.
#[inline]
pub(crate) fn encoding_of(header: u8) -> u8 {
    header >> 4
}

/// read_u64_be reads a big endian u64 at `at`, `None` if `b` is too short.
#[inline]
pub(crate) fn read_u64_be(b: &[u8], at: usize) -> Option<u64> {
    let end = at.checked_add(8)?;
    let bytes: [u8; 8] = b.get(at..end)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}
