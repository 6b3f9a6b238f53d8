use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::engine::tsm1::block::decoder::block_type;
use crate::engine::tsm1::block::encoder::encode_block;
use crate::engine::tsm1::error::TsmError;
use crate::engine::tsm1::file_store::index::IndexEntry;
use crate::engine::tsm1::file_store::writer::index_writer::{DirectIndex, IndexWriter};
use crate::engine::tsm1::file_store::{
    CHECKSUM_SIZE, FSYNC_EVERY, HEADER, MAX_INDEX_ENTRIES, MAX_KEY_LENGTH,
};
use crate::engine::tsm1::value::Values;

/// TSMWriter writes TSM formatted key and values.
#[async_trait]
pub trait TSMWriter {
    /// write writes a new block for key containing and values.  Writes append
    /// blocks in the order that the write function is called.  The caller is
    /// responsible for ensuring keys and blocks are sorted appropriately.
    /// Values are encoded as a full block.  The caller is responsible for
    /// ensuring a fixed number of values are encoded in each block as well as
    /// ensuring the Values are sorted. The first and last timestamp values are
    /// used as the minimum and maximum values for the index entry.
    async fn write(&mut self, key: &[u8], values: &Values) -> anyhow::Result<()>;

    /// write_block writes a new block for key containing the bytes in block.  write_block appends
    /// blocks in the order that the write_block function is called.  The caller is
    /// responsible for ensuring keys and blocks are sorted appropriately, and that the
    /// block and index information is correct for the block.  The min_time and max_time
    /// timestamp values are used as the minimum and maximum values for the index entry.
    async fn write_block(
        &mut self,
        key: &[u8],
        min_time: i64,
        max_time: i64,
        block: &[u8],
    ) -> anyhow::Result<()>;

    /// write_index finishes the TSM write streams and writes the index.
    async fn write_index(&mut self) -> anyhow::Result<()>;

    /// flush flushes all pending changes to the underlying file resources.
    async fn flush(&mut self) -> anyhow::Result<()>;

    /// close closes any underlying file resources.
    async fn close(self) -> anyhow::Result<()>;

    /// size returns the size in bytes of the header, the blocks and the index.
    fn size(&self) -> u32;
}

pub struct DefaultTSMWriter<I = DirectIndex>
where
    I: IndexWriter + Send + 'static,
{
    path: PathBuf,
    w: BufWriter<File>,

    index: I,
    n: u64,

    // The bytes written count of when we last fsync'd
    last_sync: u64,
}

impl DefaultTSMWriter<DirectIndex> {
    /// new creates the file at `tsm_path`, failing if it already exists.
    pub async fn new(tsm_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::with_index(tsm_path, DirectIndex::new()).await
    }
}

impl<I> DefaultTSMWriter<I>
where
    I: IndexWriter + Send + 'static,
{
    pub async fn with_index(tsm_path: impl AsRef<Path>, index: I) -> anyhow::Result<Self> {
        let path = tsm_path.as_ref().to_path_buf();
        let fd = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .await
            .map_err(|e| anyhow!("create tsm file {}: {}", path.display(), e))?;

        Ok(Self {
            path,
            w: BufWriter::with_capacity(1024 * 1024, fd),
            index,
            n: 0,
            last_sync: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_header(&mut self) -> anyhow::Result<()> {
        self.w.write_all(&HEADER).await?;
        self.n = HEADER.len() as u64;
        Ok(())
    }

    async fn sync(&mut self) -> anyhow::Result<()> {
        self.w.flush().await?;
        self.w.get_ref().sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl<I> TSMWriter for DefaultTSMWriter<I>
where
    I: IndexWriter + Send + 'static,
{
    async fn write(&mut self, key: &[u8], values: &Values) -> anyhow::Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(TsmError::MaxKeyLengthExceeded(key.len()).into());
        }

        // Nothing to write
        let (min_time, max_time) = match (values.min_time(), values.max_time()) {
            (Some(min), Some(max)) => (min, max),
            _ => return Ok(()),
        };

        let block = encode_block(values)?;
        self.write_block(key, min_time, max_time, &block).await
    }

    async fn write_block(
        &mut self,
        key: &[u8],
        min_time: i64,
        max_time: i64,
        block: &[u8],
    ) -> anyhow::Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(TsmError::MaxKeyLengthExceeded(key.len()).into());
        }

        // Nothing to write
        if block.is_empty() {
            return Ok(());
        }

        let block_type = block_type(block)?;
        let size = u32::try_from(CHECKSUM_SIZE + block.len())
            .map_err(|_| anyhow!("block of {} bytes is too large", block.len()))?;

        // Write header only after we have some data to write.
        if self.n == 0 {
            self.write_header().await?;
        }

        let checksum = crc32fast::hash(block);
        self.w.write_u32(checksum).await?;
        self.w.write_all(block).await?;

        // Record this block in index
        let index_entry = IndexEntry::new(min_time, max_time, self.n, size);
        self.index.add(key, block_type, index_entry)?;

        // Increment file position pointer
        self.n += size as u64;

        // fsync the file periodically to avoid long pauses with very big files.
        if self.n - self.last_sync > FSYNC_EVERY {
            self.sync().await?;
            self.last_sync = self.n;
        }

        if self.index.entries(key).map(|x| x.len()).unwrap_or_default() >= MAX_INDEX_ENTRIES {
            return Err(TsmError::MaxBlocksExceeded.into());
        }

        Ok(())
    }

    /// write_index writes the index section of the file.  If there are no index entries to write,
    /// this returns TsmError::NoValues.
    async fn write_index(&mut self) -> anyhow::Result<()> {
        let index_pos = self.n;

        if self.index.key_count() == 0 {
            return Err(TsmError::NoValues.into());
        }

        // Write the index
        let index = self.index.marshal_binary()?;
        self.w.write_all(&index).await?;

        // Write the index index position
        self.w.write_u64(index_pos).await?;

        Ok(())
    }

    async fn flush(&mut self) -> anyhow::Result<()> {
        self.sync().await
    }

    async fn close(mut self) -> anyhow::Result<()> {
        self.flush().await
    }

    fn size(&self) -> u32 {
        self.n as u32 + self.index.size()
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::tsm1::block::encoder::encode_block;
    use crate::engine::tsm1::error::TsmError;
    use crate::engine::tsm1::file_store::writer::tsm_writer::{DefaultTSMWriter, TSMWriter};
    use crate::engine::tsm1::file_store::MAX_KEY_LENGTH;
    use crate::engine::tsm1::value::{Value, Values};

    #[test]
    fn test_crc() {
        let checksum = crc32fast::hash("adsafafas".as_bytes());
        assert_eq!(checksum, 2344674872);
    }

    #[tokio::test]
    async fn test_tsm_writer_write_single_value() {
        let dir = tempfile::tempdir().unwrap();
        let tsm_file = dir.path().join("tsm1_test");

        let mut w = DefaultTSMWriter::new(&tsm_file).await.unwrap();

        let values = Values::Float(vec![Value::new(0, 1.0)]);

        w.write("cpu".as_bytes(), &values).await.unwrap();
        w.write_index().await.unwrap();
        w.close().await.unwrap();

        let data = tokio::fs::read(tsm_file).await.unwrap();
        assert_eq!(
            data.as_slice(),
            &[
                22, 209, 22, 209, 1, 227, 243, 238, 20, 0, 9, 28, 0, 0, 0, 0, 0, 0, 0, 0, 16, 63,
                240, 0, 0, 0, 0, 0, 0, 195, 252, 0, 128, 0, 0, 0, 0, 0, 16, 0, 3, 99, 112, 117, 0,
                0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 5, 0, 0,
                0, 34, 0, 0, 0, 0, 0, 0, 0, 39
            ]
        );
    }

    #[tokio::test]
    async fn test_tsm_writer_no_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = DefaultTSMWriter::new(dir.path().join("empty.tsm")).await.unwrap();

        // empty writes are no-ops
        w.write(b"cpu", &Values::Float(vec![])).await.unwrap();
        w.write_block(b"cpu", 0, 0, &[]).await.unwrap();
        assert_eq!(w.size(), 0);

        let err = w.write_index().await.unwrap_err();
        assert_eq!(err.downcast_ref::<TsmError>(), Some(&TsmError::NoValues));
    }

    #[tokio::test]
    async fn test_tsm_writer_limits() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = DefaultTSMWriter::new(dir.path().join("limits.tsm")).await.unwrap();

        let values = Values::Integer(vec![Value::new(1, 1)]);
        let key = vec![b'a'; MAX_KEY_LENGTH + 1];
        let err = w.write(&key, &values).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<TsmError>(),
            Some(&TsmError::MaxKeyLengthExceeded(MAX_KEY_LENGTH + 1))
        );

        w.write(b"mem", &values).await.unwrap();
        let err = w.write(b"cpu", &values).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TsmError>(),
            Some(TsmError::UnsortedKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_tsm_writer_write_block() {
        let dir = tempfile::tempdir().unwrap();
        let tsm_file = dir.path().join("block.tsm");

        let values = Values::Bool(vec![Value::new(1, true), Value::new(2, false)]);
        let block = encode_block(&values).unwrap();

        let mut w = DefaultTSMWriter::new(&tsm_file).await.unwrap();
        assert_eq!(w.path(), tsm_file.as_path());
        w.write_block(b"cpu", 1, 2, &block).await.unwrap();
        w.write_index().await.unwrap();
        let size = w.size();
        w.close().await.unwrap();

        let data = tokio::fs::read(&tsm_file).await.unwrap();
        // blocks and index, the footer is not counted
        assert_eq!(size as usize, data.len() - 8);
        assert_eq!(&data[5..9], &crc32fast::hash(&block).to_be_bytes());
        assert!(DefaultTSMWriter::new(&tsm_file).await.is_err());
    }
}
