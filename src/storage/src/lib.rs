#[macro_use]
extern crate async_trait;

use std::io;

pub mod mmap;

/// RandomAccessFile is a read-only file addressed by absolute offsets.
#[async_trait]
pub trait RandomAccessFile: Send + Sync {
    /// read fills `buf` from `offset`. A range past the end fails with `UnexpectedEof`.
    async fn read(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// len returns the size of the file in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn close(self) -> io::Result<()>;
}

#[async_trait]
pub trait RandomAccessFileExt: RandomAccessFile {
    async fn read_u8(&self, offset: u64) -> io::Result<u8> {
        let mut buf = [0; 1];
        self.read(offset, &mut buf).await?;
        Ok(buf[0])
    }

    async fn read_u16(&self, offset: u64) -> io::Result<u16> {
        let mut buf = [0; 2];
        self.read(offset, &mut buf).await?;
        Ok(u16::from_be_bytes(buf))
    }

    async fn read_u32(&self, offset: u64) -> io::Result<u32> {
        let mut buf = [0; 4];
        self.read(offset, &mut buf).await?;
        Ok(u32::from_be_bytes(buf))
    }

    async fn read_u64(&self, offset: u64) -> io::Result<u64> {
        let mut buf = [0; 8];
        self.read(offset, &mut buf).await?;
        Ok(u64::from_be_bytes(buf))
    }

    /// read_vec reads exactly `len` bytes starting at `offset`.
    async fn read_vec(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read(offset, buf.as_mut_slice()).await?;
        Ok(buf)
    }
}

impl<R: RandomAccessFile + ?Sized> RandomAccessFileExt for R {}
