use std::cmp::Ordering;

use bytes::BufMut;

use crate::engine::tsm1::error::TsmError;
use crate::engine::tsm1::file_store::index::{IndexEntries, IndexEntry};
use crate::engine::tsm1::file_store::{
    INDEX_COUNT_SIZE, INDEX_ENTRY_SIZE, INDEX_KEY_LEN_SIZE, INDEX_TYPE_SIZE, MAX_INDEX_ENTRIES,
};

/// IndexWriter builds the index section of a TSM file.
pub trait IndexWriter {
    /// add records a new block entry for a key in the index. Keys must arrive in ascending
    /// order, all blocks of a key together.
    fn add(&mut self, key: &[u8], block_type: u8, index_entry: IndexEntry) -> anyhow::Result<()>;

    /// entries returns all index entries for a key.
    fn entries(&self, key: &[u8]) -> Option<&[IndexEntry]>;

    /// key_count returns the count of unique keys in the index.
    fn key_count(&self) -> usize;

    /// size returns the size of the current index in bytes.
    fn size(&self) -> u32;

    /// marshal_binary returns the encoded index.
    fn marshal_binary(&mut self) -> anyhow::Result<Vec<u8>>;
}

/// DirectIndex is a simple in-memory index implementation for a TSM file.  The full index
/// must fit in memory.
#[derive(Default)]
pub struct DirectIndex {
    key_count: usize,
    size: u32,

    /// encoded sections of the keys already completed
    buf: Vec<u8>,

    key: Vec<u8>,
    index_entries: IndexEntries,
}

impl DirectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// entry returns the entry of key whose block may hold time t.
    pub fn entry(&self, key: &[u8], t: i64) -> Option<&IndexEntry> {
        self.entries(key)?.iter().find(|entry| entry.contains(t))
    }

    fn start_key(&mut self, key: &[u8], block_type: u8, index_entry: IndexEntry) {
        // size of the key stored in the index
        self.size += (INDEX_KEY_LEN_SIZE + key.len() + INDEX_TYPE_SIZE) as u32;
        // size of the count of entries stored in the index
        self.size += INDEX_COUNT_SIZE as u32;

        self.key.clear();
        self.key.extend_from_slice(key);
        self.index_entries = IndexEntries::new(block_type);
        self.index_entries.push(index_entry);

        // size of the encoded index entry
        self.size += INDEX_ENTRY_SIZE as u32;
        self.key_count += 1;
    }

    /// flush encodes the section of the current key into buf.
    fn flush(&mut self) -> anyhow::Result<()> {
        if self.key.is_empty() {
            return Ok(());
        }

        if self.index_entries.len() > MAX_INDEX_ENTRIES {
            return Err(anyhow!(
                "key '{}' exceeds max index entries: {} > {}",
                String::from_utf8_lossy(&self.key),
                self.index_entries.len(),
                MAX_INDEX_ENTRIES
            ));
        }

        // For each key, individual entries are sorted by time
        self.index_entries.sort();

        // Append the key length and key
        self.buf.put_u16(self.key.len() as u16);
        self.buf.extend_from_slice(&self.key);

        // Append the block type and count
        self.buf.put_u8(self.index_entries.typ);
        self.buf.put_u16(self.index_entries.len() as u16);

        // Append each index entry for all blocks for this key
        self.index_entries.append_to(&mut self.buf);

        self.key.clear();
        self.index_entries = IndexEntries::default();
        Ok(())
    }
}

impl IndexWriter for DirectIndex {
    fn add(&mut self, key: &[u8], block_type: u8, index_entry: IndexEntry) -> anyhow::Result<()> {
        // Is this the first block being added?
        if self.key.is_empty() && self.key_count == 0 {
            self.start_key(key, block_type, index_entry);
            return Ok(());
        }

        match self.key.as_slice().cmp(key) {
            Ordering::Equal => {
                // The last block is still this key
                self.index_entries.push(index_entry);
                // size of the encoded index entry
                self.size += INDEX_ENTRY_SIZE as u32;
            }
            Ordering::Less => {
                // We have a new key that is greater than the last one so we need to add
                // a new index block section.
                self.flush()?;
                self.start_key(key, block_type, index_entry);
            }
            Ordering::Greater => {
                // Keys can't be added out of order.
                return Err(TsmError::UnsortedKey {
                    key: String::from_utf8_lossy(key).into_owned(),
                    prev: String::from_utf8_lossy(&self.key).into_owned(),
                }
                .into());
            }
        }

        Ok(())
    }

    fn entries(&self, key: &[u8]) -> Option<&[IndexEntry]> {
        if !self.key.is_empty() && self.key.as_slice() == key {
            return Some(self.index_entries.entries.as_slice());
        }
        None
    }

    fn key_count(&self) -> usize {
        self.key_count
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn marshal_binary(&mut self) -> anyhow::Result<Vec<u8>> {
        self.flush()?;
        Ok(self.buf.clone())
    }
}
