//! Unsigned LEB128 varints, 7 bits per byte with the high bit set on all but the last byte.

/// MAX_VARINT_LEN64 is the maximum length of a varint-encoded 64-bit integer.
pub const MAX_VARINT_LEN64: usize = 10;

pub trait VarInt: Sized + Copy {
    /// encode_var writes the varint into `dst` and returns the number of bytes used.
    /// `dst` must hold at least `MAX_VARINT_LEN64` bytes.
    fn encode_var(self, dst: &mut [u8]) -> usize;

    /// decode_var returns the value and the number of bytes read, or `None` if `src` is
    /// truncated or the value overflows 64 bits.
    fn decode_var(src: &[u8]) -> Option<(Self, usize)>;

    fn encode_var_vec(self, dst: &mut Vec<u8>) -> usize {
        let mut tmp = [0u8; MAX_VARINT_LEN64];
        let n = self.encode_var(&mut tmp);
        dst.extend_from_slice(&tmp[..n]);
        n
    }
}

impl VarInt for u64 {
    fn encode_var(self, dst: &mut [u8]) -> usize {
        let mut v = self;
        let mut i = 0;
        while v >= 0x80 {
            dst[i] = (v as u8) | 0x80;
            v >>= 7;
            i += 1;
        }
        dst[i] = v as u8;
        i + 1
    }

    fn decode_var(src: &[u8]) -> Option<(Self, usize)> {
        let mut x = 0u64;
        let mut s = 0u32;
        for (i, &b) in src.iter().enumerate() {
            if i == MAX_VARINT_LEN64 {
                return None;
            }
            if b < 0x80 {
                if i == MAX_VARINT_LEN64 - 1 && b > 1 {
                    return None;
                }
                return Some((x | (b as u64) << s, i + 1));
            }
            x |= ((b & 0x7f) as u64) << s;
            s += 7;
        }
        None
    }
}

impl VarInt for usize {
    fn encode_var(self, dst: &mut [u8]) -> usize {
        (self as u64).encode_var(dst)
    }

    fn decode_var(src: &[u8]) -> Option<(Self, usize)> {
        let (v, n) = u64::decode_var(src)?;
        usize::try_from(v).ok().map(|v| (v, n))
    }
}
