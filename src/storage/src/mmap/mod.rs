use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use tokio::fs::File;

use crate::RandomAccessFile;

/// MmapReadableFile maps a whole file read-only into memory on open.
pub struct MmapReadableFile {
    path: PathBuf,
    f: File,
    len: u64,
    /// `None` for an empty file, which can not be mapped.
    mmap: Option<Mmap>,
}

impl MmapReadableFile {
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let f = File::open(&path).await?;

        let meta = f.metadata().await?;
        let len = meta.len();

        let mmap = if len == 0 {
            None
        } else {
            // SAFETY: the mapping is read-only and the file is kept open for its whole lifetime.
            Some(unsafe { MmapOptions::new().offset(0).len(len as usize).map(&f)? })
        };

        Ok(Self { path, f, len, mmap })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

#[async_trait]
impl RandomAccessFile for MmapReadableFile {
    async fn read(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let size = buf.len();
        if size == 0 {
            return Ok(0);
        }

        let upper = offset.checked_add(size as u64);
        let mmap = match (upper, self.mmap.as_ref()) {
            (Some(upper), Some(mmap)) if upper <= self.len => mmap,
            _ => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!(
                        "read [{}, +{}) beyond end of {} ({} bytes)",
                        offset,
                        size,
                        self.path.display(),
                        self.len
                    ),
                ))
            }
        };

        let offset = offset as usize;
        buf.copy_from_slice(&mmap[offset..offset + size]);

        Ok(size)
    }

    fn len(&self) -> u64 {
        self.len
    }

    async fn close(self) -> io::Result<()> {
        let Self { f, mmap, .. } = self;
        drop(mmap);
        drop(f);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use tokio::fs::File;
    use tokio::io;
    use tokio::io::AsyncWriteExt;

    use crate::mmap::MmapReadableFile;
    use crate::{RandomAccessFile, RandomAccessFileExt};

    #[tokio::test]
    async fn test_mmap_readable_file() -> io::Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let tsm_file = dir.as_ref().join("tsm1_test");

        let data = "0123456789".as_bytes();
        {
            let mut f = File::create(&tsm_file).await?;
            f.write_all(data).await?;
            f.sync_all().await?;
        }

        let accessor = MmapReadableFile::open(&tsm_file).await?;
        assert_eq!(accessor.len(), data.len() as u64);
        assert_eq!(accessor.path(), tsm_file.as_path());

        let mut buf = vec![0_u8; data.len()];
        accessor.read(0, &mut buf[..]).await?;
        assert_eq!(buf.as_slice(), data);

        let mut tail = [0_u8; 3];
        accessor.read(7, &mut tail).await?;
        assert_eq!(&tail, b"789");

        assert_eq!(accessor.read_u8(1).await?, b'1');
        assert_eq!(
            accessor.read_u16(0).await?,
            u16::from_be_bytes([b'0', b'1'])
        );

        let err = accessor.read(8, &mut tail).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);

        let err = accessor.read(u64::MAX, &mut tail).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);

        accessor.close().await
    }

    #[tokio::test]
    async fn test_mmap_empty_file() -> io::Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.as_ref().join("empty");
        File::create(&path).await?;

        let accessor = MmapReadableFile::open(&path).await?;
        assert!(accessor.is_empty());

        let mut buf = [0_u8; 1];
        let err = accessor.read(0, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);

        // zero-length reads always succeed
        assert_eq!(accessor.read(0, &mut []).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_mmap_open_missing() {
        let dir = tempfile::tempdir().unwrap();
        let r = MmapReadableFile::open(dir.as_ref().join("missing")).await;
        assert_eq!(r.err().map(|e| e.kind()), Some(ErrorKind::NotFound));
    }
}
