//! simple8b packs several small unsigned integers into one 64 bit word.
//!
//! The top 4 bits of a word select how the remaining 60 bits are split. Selectors 0 and 1
//! are special and encode runs of 240 and 120 ones without payload bits.
//!
//! ┌──────────────┬─────────────────────────────────────────────────────────────┐
//! │   Selector   │       0    1   2   3   4   5   6   7  8  9  10 11 12 13 14 15│
//! ├──────────────┼─────────────────────────────────────────────────────────────┤
//! │     Bits     │       0    0   1   2   3   4   5   6  7  8  10 12 15 20 30 60│
//! │      N       │     240  120  60  30  20  15  12  10  8  7   6  5  4  3  2  1│
//! └──────────────┴─────────────────────────────────────────────────────────────┘

/// MAX_VALUE is the largest value that can be encoded.
pub const MAX_VALUE: u64 = (1 << 60) - 1;

/// (values per word, bits per value) for each selector
const SELECTOR: [(usize, u32); 16] = [
    (240, 0),
    (120, 0),
    (60, 1),
    (30, 2),
    (20, 3),
    (15, 4),
    (12, 5),
    (10, 6),
    (8, 7),
    (7, 8),
    (6, 10),
    (5, 12),
    (4, 15),
    (3, 20),
    (2, 30),
    (1, 60),
];

/// max values a single word can hold
pub const MAX_PACKED: usize = 240;

#[inline]
fn selector_of(v: u64) -> usize {
    (v >> 60) as usize
}

#[inline]
fn max_for(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

fn pack(sel: usize, src: &[u64]) -> u64 {
    let (n, bits) = SELECTOR[sel];
    src[..n]
        .iter()
        .enumerate()
        .fold((sel as u64) << 60, |word, (k, v)| word | v << (k as u32 * bits))
}

fn unpack(v: u64, dst: &mut [u64]) -> usize {
    let sel = selector_of(v);
    let (n, bits) = SELECTOR[sel];
    if bits == 0 {
        dst[..n].fill(1);
    } else {
        let mask = max_for(bits);
        for (k, d) in dst[..n].iter_mut().enumerate() {
            *d = (v >> (k as u32 * bits)) & mask;
        }
    }
    n
}

/// can_pack reports whether the first `n` values of `src` fit in `bits` bits each.
/// A run selector (bits == 0) needs every value of `src` to be one.
fn can_pack(src: &[u64], n: usize, bits: u32) -> bool {
    if src.len() < n {
        return false;
    }

    if bits == 0 {
        return src.iter().all(|v| *v == 1);
    }

    let max = max_for(bits);
    src[..n].iter().all(|v| *v <= max)
}

/// encode packs as many leading values of `src` as possible into one word and returns it with
/// the number of values consumed.
pub fn encode(src: &[u64]) -> anyhow::Result<(u64, usize)> {
    for (sel, &(n, bits)) in SELECTOR.iter().enumerate() {
        if can_pack(src, n, bits) {
            let word = if bits == 0 {
                (sel as u64) << 60
            } else {
                pack(sel, src)
            };
            return Ok((word, n));
        }
    }

    if src.is_empty() {
        Ok((0, 0))
    } else {
        Err(anyhow!("value out of bounds: {:?}", src))
    }
}

/// encode_all packs `src` into words written back over the front of `src` and returns the
/// number of words.
pub fn encode_all(src: &mut [u64]) -> anyhow::Result<usize> {
    let mut i = 0;
    let mut j = 0;

    'next_value: while i < src.len() {
        let remaining = &src[i..];

        if remaining.len() >= 120 {
            let run = if remaining.len() >= 240 { 240 } else { 120 };
            let ones = remaining[..run].iter().take_while(|v| **v == 1).count();
            let packed = if ones == 240 {
                Some((0u64, 240))
            } else if ones >= 120 {
                Some((1u64 << 60, 120))
            } else {
                None
            };
            if let Some((word, n)) = packed {
                src[j] = word;
                j += 1;
                i += n;
                continue 'next_value;
            }
        }

        for sel in 2..SELECTOR.len() {
            let (n, bits) = SELECTOR[sel];
            if remaining.len() < n {
                continue;
            }
            let max = max_for(bits);
            if remaining[..n].iter().any(|v| *v > max) {
                continue;
            }

            let word = pack(sel, remaining);
            src[j] = word;
            j += 1;
            i += n;
            continue 'next_value;
        }

        return Err(anyhow!("value out of bounds"));
    }

    Ok(j)
}

/// decode unpacks `v` into `dst` and returns the number of values. `dst` must hold
/// `MAX_PACKED` values.
pub fn decode(dst: &mut [u64], v: u64) -> usize {
    unpack(v, dst)
}

/// decode_all unpacks every word of `src` into `dst`.
pub fn decode_all(dst: &mut Vec<u64>, src: &[u64]) {
    let mut buf = [0u64; MAX_PACKED];
    for v in src {
        let n = unpack(*v, &mut buf);
        dst.extend_from_slice(&buf[..n]);
    }
}

/// count_bytes returns the number of values packed in the big endian words of `b`.
pub fn count_bytes(b: &[u8]) -> anyhow::Result<usize> {
    if b.len() % 8 != 0 {
        return Err(anyhow!("invalid slice len remaining: {}", b.len() % 8));
    }

    Ok(b.chunks_exact(8)
        .map(|w| {
            let mut word = [0u8; 8];
            word.copy_from_slice(w);
            SELECTOR[selector_of(u64::from_be_bytes(word))].0
        })
        .sum())
}

/// Encoder converts a stream of unsigned 64bit integers to a compressed byte slice.
pub struct Encoder {
    /// most recently written integers that have not been flushed
    buf: [u64; MAX_PACKED],
    /// index in buf of the head of the buf
    h: usize,
    /// index in buf of the tail of the buf
    t: usize,

    bytes: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            buf: [0; MAX_PACKED],
            h: 0,
            t: 0,
            bytes: Vec::with_capacity(128),
        }
    }

    pub fn write(&mut self, v: u64) -> anyhow::Result<()> {
        if self.t >= self.buf.len() {
            self.flush()?;
        }

        // still full but the head moved forward: shift the pending values down
        if self.t >= self.buf.len() {
            self.buf.copy_within(self.h..self.t, 0);
            self.t -= self.h;
            self.h = 0;
        }

        self.buf[self.t] = v;
        self.t += 1;
        Ok(())
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        if self.t == 0 {
            return Ok(());
        }

        let (encoded, n) = encode(&self.buf[self.h..self.t])?;
        self.bytes.extend_from_slice(&encoded.to_be_bytes());

        self.h += n;
        if self.h == self.t {
            self.h = 0;
            self.t = 0;
        }
        Ok(())
    }

    pub fn bytes(&mut self) -> anyhow::Result<&[u8]> {
        while self.t > 0 {
            self.flush()?;
        }
        Ok(self.bytes.as_slice())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
