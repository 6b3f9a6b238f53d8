use influxdb_storage::{RandomAccessFile, RandomAccessFileExt};

use crate::engine::tsm1::block::decoder::decode_block;
use crate::engine::tsm1::error::TsmError;
use crate::engine::tsm1::file_store::index::IndexEntry;
use crate::engine::tsm1::file_store::CHECKSUM_SIZE;
use crate::engine::tsm1::value::Values;

/// BlockAccessor reads the checksummed blocks of a TSM file.
pub struct BlockAccessor<F>
where
    F: RandomAccessFile,
{
    file: F,

    /// end of the data section, blocks must not cross it
    max_offset: u64,
}

impl<F> BlockAccessor<F>
where
    F: RandomAccessFile,
{
    pub fn new(file: F, max_offset: u64) -> Self {
        Self { file, max_offset }
    }

    /// read_block returns the block data of entry after verifying its checksum.
    pub async fn read_block(&self, entry: &IndexEntry) -> anyhow::Result<Vec<u8>> {
        let out_of_range = || TsmError::BlockOutOfRange {
            offset: entry.offset,
            size: entry.size,
            max: self.max_offset,
        };

        let end = entry
            .offset
            .checked_add(entry.size as u64)
            .ok_or_else(out_of_range)?;
        if end > self.max_offset || (entry.size as usize) < CHECKSUM_SIZE {
            return Err(out_of_range().into());
        }

        let stored = self.file.read_u32(entry.offset).await?;
        let block = self
            .file
            .read_vec(
                entry.offset + CHECKSUM_SIZE as u64,
                entry.size as usize - CHECKSUM_SIZE,
            )
            .await?;

        let computed = crc32fast::hash(&block);
        if stored != computed {
            return Err(TsmError::ChecksumMismatch {
                offset: entry.offset,
                stored,
                computed,
            }
            .into());
        }

        Ok(block)
    }

    /// read_block_into decodes the block of entry and appends its points to values.
    pub async fn read_block_into(
        &self,
        entry: &IndexEntry,
        values: &mut Values,
    ) -> anyhow::Result<()> {
        let block = self.read_block(entry).await?;
        decode_block(&block, values)
            .map_err(|e| anyhow!("decode block at offset {}: {}", entry.offset, e))
    }

    pub async fn close(self) -> anyhow::Result<()> {
        self.file.close().await?;
        Ok(())
    }
}
