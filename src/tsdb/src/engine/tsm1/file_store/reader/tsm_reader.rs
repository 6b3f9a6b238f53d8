use influxdb_storage::{RandomAccessFile, RandomAccessFileExt};
use tracing::debug;

use crate::engine::tsm1::file_store::index::{IndexEntries, IndexEntry};
use crate::engine::tsm1::file_store::reader::block_reader::BlockAccessor;
use crate::engine::tsm1::file_store::reader::index_reader::{IndirectIndex, TSMIndex};
use crate::engine::tsm1::file_store::{
    KeyRange, TimeRange, FOOTER_SIZE, HEADER, MAGIC_NUMBER, VERSION,
};
use crate::engine::tsm1::value::Values;

/// TSMReader is a read-only view of an on-disk TSM file.
#[async_trait]
pub trait TSMReader: Send + Sync {
    /// key_count returns the number of distinct keys in the file.
    fn key_count(&self) -> usize;

    /// key_at returns the key and block type located at index position idx.
    fn key_at(&self, idx: usize) -> Option<(&[u8], u8)>;

    /// contains returns true if the file contains any values for the given key.
    fn contains(&self, key: &[u8]) -> bool;

    /// block_type returns the block type of the values stored for the key.  If key does not
    /// exist, an error is returned.
    fn block_type(&self, key: &[u8]) -> anyhow::Result<u8>;

    /// read_entries returns the index entries for all blocks for the given key.
    fn read_entries(&self, key: &[u8], entries: &mut IndexEntries) -> anyhow::Result<()>;

    /// read_block_at appends the values of the block identified by entry.
    async fn read_block_at(&self, entry: &IndexEntry, values: &mut Values) -> anyhow::Result<()>;

    /// read_all returns all the values of key, block after block.
    async fn read_all(&self, key: &[u8]) -> anyhow::Result<Values>;

    /// time_range returns the min and max time across all keys in the file.
    fn time_range(&self) -> TimeRange;

    /// key_range returns the min and max keys in the file.
    fn key_range(&self) -> KeyRange;

    /// index_size returns the size of the index section in bytes.
    fn index_size(&self) -> u32;

    /// close closes the underlying file resources.
    async fn close(self) -> anyhow::Result<()>
    where
        Self: Sized;
}

pub struct DefaultTSMReader<F>
where
    F: RandomAccessFile,
{
    /// index is the index of all blocks.
    index: IndirectIndex,

    /// accessor provides access and decoding of blocks for the reader.
    accessor: BlockAccessor<F>,

    /// size is the size of the file on disk.
    size: u64,
}

impl<F> DefaultTSMReader<F>
where
    F: RandomAccessFile,
{
    /// new validates the header and footer of `file` and loads its index.
    pub async fn new(file: F) -> anyhow::Result<Self> {
        let size = file.len();
        let min_size = (HEADER.len() + FOOTER_SIZE) as u64;
        if size < min_size {
            return Err(anyhow!(
                "init: file too small for a tsm file: {} < {} bytes",
                size,
                min_size
            ));
        }

        Self::verify_version(&file).await?;

        let index_ofs_pos = size - FOOTER_SIZE as u64;
        let index_start = file
            .read_u64(index_ofs_pos)
            .await
            .map_err(|e| anyhow!("init: error reading index offset: {}", e))?;
        if index_start < HEADER.len() as u64 || index_start > index_ofs_pos {
            return Err(anyhow!(
                "init: invalid index offset {}, index must lie in [{}, {}]",
                index_start,
                HEADER.len(),
                index_ofs_pos
            ));
        }

        let b = file
            .read_vec(index_start, (index_ofs_pos - index_start) as usize)
            .await
            .map_err(|e| anyhow!("init: error reading index: {}", e))?;
        let index = IndirectIndex::unmarshal_binary(b)?;

        debug!(
            size,
            index_start,
            keys = index.key_count(),
            "opened tsm file"
        );

        Ok(Self {
            index,
            accessor: BlockAccessor::new(file, index_start),
            size,
        })
    }

    async fn verify_version(file: &F) -> anyhow::Result<()> {
        let magic_number = file
            .read_u32(0)
            .await
            .map_err(|e| anyhow!("init: error reading magic number of file: {}", e))?;
        if magic_number != MAGIC_NUMBER {
            return Err(anyhow!("can only read from tsm file"));
        }

        let version = file
            .read_u8(4)
            .await
            .map_err(|e| anyhow!("init: error reading version: {}", e))?;
        if version != VERSION {
            return Err(anyhow!(
                "init: file is version {}. expected {}",
                version,
                VERSION
            ));
        }

        Ok(())
    }

    /// size returns the size of the file on disk in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

#[async_trait]
impl<F> TSMReader for DefaultTSMReader<F>
where
    F: RandomAccessFile,
{
    fn key_count(&self) -> usize {
        self.index.key_count()
    }

    fn key_at(&self, idx: usize) -> Option<(&[u8], u8)> {
        self.index.key_at(idx)
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.index.contains(key)
    }

    fn block_type(&self, key: &[u8]) -> anyhow::Result<u8> {
        self.index.block_type(key)
    }

    fn read_entries(&self, key: &[u8], entries: &mut IndexEntries) -> anyhow::Result<()> {
        self.index.read_entries(key, entries)
    }

    async fn read_block_at(&self, entry: &IndexEntry, values: &mut Values) -> anyhow::Result<()> {
        self.accessor.read_block_into(entry, values).await
    }

    async fn read_all(&self, key: &[u8]) -> anyhow::Result<Values> {
        let mut entries = IndexEntries::default();
        self.index.read_entries(key, &mut entries)?;

        let mut values = Values::new(entries.typ)?;
        for entry in &entries.entries {
            self.accessor.read_block_into(entry, &mut values).await?;
        }

        Ok(values)
    }

    fn time_range(&self) -> TimeRange {
        self.index.time_range()
    }

    fn key_range(&self) -> KeyRange {
        self.index.key_range()
    }

    fn index_size(&self) -> u32 {
        self.index.size()
    }

    async fn close(self) -> anyhow::Result<()> {
        self.accessor.close().await
    }
}
