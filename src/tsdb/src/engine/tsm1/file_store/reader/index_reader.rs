use std::cmp::Ordering;

use crate::engine::tsm1::error::TsmError;
use crate::engine::tsm1::file_store::index::{IndexEntries, IndexEntry};
use crate::engine::tsm1::file_store::{
    KeyRange, TimeRange, INDEX_COUNT_SIZE, INDEX_ENTRY_SIZE, INDEX_KEY_LEN_SIZE, INDEX_TYPE_SIZE,
};

/// TSMIndex represent the index section of a TSM file.  The index records all
/// blocks, their locations, sizes, min and max times.
pub trait TSMIndex: Send + Sync {
    /// contains return true if the given key exists in the index.
    fn contains(&self, key: &[u8]) -> bool;

    /// read_entries reads the index entries for key into entries.
    fn read_entries(&self, key: &[u8], entries: &mut IndexEntries) -> anyhow::Result<()>;

    /// key_at returns the key in the index at the given position.
    fn key_at(&self, index: usize) -> Option<(&[u8], u8)>;

    /// key_count returns the count of unique keys in the index.
    fn key_count(&self) -> usize;

    /// size returns the size of the current index in bytes.
    fn size(&self) -> u32;

    /// time_range returns the min and max time across all keys in the file.
    fn time_range(&self) -> TimeRange;

    /// key_range returns the min and max keys in the file.
    fn key_range(&self) -> KeyRange;

    /// block_type returns the block type of the values stored for the key.  If key does not
    /// exist, an error is returned.
    fn block_type(&self, key: &[u8]) -> anyhow::Result<u8>;
}

/// IndirectIndex is a TSMIndex that keeps the raw index bytes and the position of every key
/// section within them.
#[derive(Debug)]
pub struct IndirectIndex {
    b: Vec<u8>,

    /// start of each key section in b, in key order
    offsets: Vec<usize>,

    min_key: Vec<u8>,
    max_key: Vec<u8>,

    min_time: i64,
    max_time: i64,
}

impl IndirectIndex {
    /// unmarshal_binary validates the index section `b` and records where each key starts.
    pub fn unmarshal_binary(b: Vec<u8>) -> anyhow::Result<Self> {
        let mut offsets = Vec::new();
        let mut min_time = i64::MAX;
        let mut max_time = i64::MIN;

        let mut prev_key: Option<&[u8]> = None;
        let mut i = 0;
        while i < b.len() {
            offsets.push(i);

            // Skip to the start of the key
            let key_len = read_u16(&b, i)
                .ok_or_else(|| anyhow!("indirectIndex: not enough data for key length"))?
                as usize;
            i += INDEX_KEY_LEN_SIZE;

            let key = b
                .get(i..i + key_len)
                .ok_or_else(|| anyhow!("indirectIndex: not enough data for key"))?;
            if let Some(prev) = prev_key {
                if prev.cmp(key) != Ordering::Less {
                    return Err(TsmError::UnsortedKey {
                        key: String::from_utf8_lossy(key).into_owned(),
                        prev: String::from_utf8_lossy(prev).into_owned(),
                    }
                    .into());
                }
            }
            prev_key = Some(key);

            // Skip over the key and the block type
            i += key_len + INDEX_TYPE_SIZE;

            let count = read_u16(&b, i)
                .ok_or_else(|| anyhow!("indirectIndex: not enough data for index entries count"))?
                as usize;
            i += INDEX_COUNT_SIZE;
            if count == 0 {
                return Err(anyhow!(
                    "indirectIndex: key exists in index but has no entries"
                ));
            }

            let end = i + count * INDEX_ENTRY_SIZE;
            if end > b.len() {
                return Err(anyhow!("indirectIndex: not enough data for index entries"));
            }

            // The first entry holds the min time of the key, the last entry its max time.
            let first = IndexEntry::unmarshal_binary(&b[i..])?;
            let last = IndexEntry::unmarshal_binary(&b[end - INDEX_ENTRY_SIZE..])?;
            min_time = min_time.min(first.min_time);
            max_time = max_time.max(last.max_time);

            i = end;
        }

        let min_key = offsets.first().map(|o| key_at(&b, *o).to_vec());
        let max_key = offsets.last().map(|o| key_at(&b, *o).to_vec());

        Ok(Self {
            b,
            offsets,
            min_key: min_key.unwrap_or_default(),
            max_key: max_key.unwrap_or_default(),
            min_time,
            max_time,
        })
    }

    fn key_at_offset(&self, offset: usize) -> &[u8] {
        key_at(&self.b, offset)
    }

    /// search returns the position of key in offsets.
    fn search(&self, key: &[u8]) -> Result<usize, usize> {
        self.offsets
            .binary_search_by(|offset| self.key_at_offset(*offset).cmp(key))
    }

    /// entries_at decodes the block type and entries of the key section at `offset`.
    fn entries_at(&self, offset: usize, entries: &mut IndexEntries) -> anyhow::Result<()> {
        let key_len = read_u16(&self.b, offset).unwrap_or_default() as usize;
        let mut i = offset + INDEX_KEY_LEN_SIZE + key_len;

        entries.typ = self.b[i];
        i += INDEX_TYPE_SIZE;

        let count = read_u16(&self.b, i).unwrap_or_default() as usize;
        i += INDEX_COUNT_SIZE;

        entries.entries.clear();
        entries.entries.reserve(count);
        for _ in 0..count {
            entries.push(IndexEntry::unmarshal_binary(&self.b[i..])?);
            i += INDEX_ENTRY_SIZE;
        }
        Ok(())
    }
}

impl TSMIndex for IndirectIndex {
    fn contains(&self, key: &[u8]) -> bool {
        self.search(key).is_ok()
    }

    fn read_entries(&self, key: &[u8], entries: &mut IndexEntries) -> anyhow::Result<()> {
        match self.search(key) {
            Ok(pos) => self.entries_at(self.offsets[pos], entries),
            Err(_) => Err(TsmError::KeyNotFound(String::from_utf8_lossy(key).into_owned()).into()),
        }
    }

    fn key_at(&self, index: usize) -> Option<(&[u8], u8)> {
        let offset = *self.offsets.get(index)?;
        let key = self.key_at_offset(offset);
        let typ = self.b[offset + INDEX_KEY_LEN_SIZE + key.len()];
        Some((key, typ))
    }

    fn key_count(&self) -> usize {
        self.offsets.len()
    }

    fn size(&self) -> u32 {
        self.b.len() as u32
    }

    fn time_range(&self) -> TimeRange {
        TimeRange::new(self.min_time, self.max_time)
    }

    fn key_range(&self) -> KeyRange {
        KeyRange::new(self.min_key.as_slice(), self.max_key.as_slice())
    }

    fn block_type(&self, key: &[u8]) -> anyhow::Result<u8> {
        match self.search(key) {
            Ok(pos) => {
                let offset = self.offsets[pos];
                let key_len = self.key_at_offset(offset).len();
                Ok(self.b[offset + INDEX_KEY_LEN_SIZE + key_len])
            }
            Err(_) => Err(TsmError::KeyNotFound(String::from_utf8_lossy(key).into_owned()).into()),
        }
    }
}

/// key_at returns the key of the section at `offset`, which must have been validated.
fn key_at(b: &[u8], offset: usize) -> &[u8] {
    let key_len = read_u16(b, offset).unwrap_or_default() as usize;
    let start = offset + INDEX_KEY_LEN_SIZE;
    &b[start..start + key_len]
}

fn read_u16(b: &[u8], at: usize) -> Option<u16> {
    let bytes: [u8; 2] = b.get(at..at.checked_add(2)?)?.try_into().ok()?;
    Some(u16::from_be_bytes(bytes))
}
