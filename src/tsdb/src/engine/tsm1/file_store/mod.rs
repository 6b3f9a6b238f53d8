pub mod index;
pub mod reader;
pub mod writer;

/// MAGIC_NUMBER is written as the first 4 bytes of a data file to
/// identify the file as a tsm1 formatted file
pub const MAGIC_NUMBER: u32 = 0x16D116D1;

/// VERSION indicates the version of the TSM file format.
pub const VERSION: u8 = 1;

/// File header: | magic number(4B) | VERSION(1B) |
pub const HEADER: [u8; 5] = [22, 209, 22, 209, 1];

/// size in bytes of the footer holding the index offset
pub const FOOTER_SIZE: usize = 8;

/// size in bytes of the block checksum
pub const CHECKSUM_SIZE: usize = 4;

/// size in bytes of an index entry
pub const INDEX_ENTRY_SIZE: usize = 28;

/// size in bytes used to store the count of index entries for a key
pub const INDEX_COUNT_SIZE: usize = 2;

/// size in bytes used to store the type of block encoded
pub const INDEX_TYPE_SIZE: usize = 1;

/// size in bytes used to store the length of a key
pub const INDEX_KEY_LEN_SIZE: usize = 2;

/// Max number of blocks for a given key that can exist in a single file
pub const MAX_INDEX_ENTRIES: usize = (1 << (INDEX_COUNT_SIZE * 8)) - 1;

/// max length of a key in an index entry (measurement + tags)
pub const MAX_KEY_LENGTH: usize = (1 << (2 * 8)) - 1;

/// The threshold amount data written before we periodically fsync a TSM file.  This helps avoid
/// long pauses due to very large fsyncs at the end of writing a TSM file.
pub const FSYNC_EVERY: u64 = 25 * 1024 * 1024;

/// TimeRange holds a min and max timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub min: i64,
    pub max: i64,
}

impl TimeRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn unbound() -> Self {
        Self::new(i64::MIN, i64::MAX)
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.min <= other.max && self.max >= other.min
    }
}

/// KeyRange holds the smallest and the largest key of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRange {
    pub min: Vec<u8>,
    pub max: Vec<u8>,
}

impl KeyRange {
    pub fn new(min: impl Into<Vec<u8>>, max: impl Into<Vec<u8>>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// overlaps returns true if [min, max] intersects the range.
    pub fn overlaps(&self, min: &[u8], max: &[u8]) -> bool {
        self.min.as_slice() <= max && self.max.as_slice() >= min
    }
}

#[cfg(test)]
mod tests {
    use influxdb_storage::mmap::MmapReadableFile;

    use crate::engine::tsm1::block::{BLOCK_FLOAT64, BLOCK_INTEGER, BLOCK_STRING};
    use crate::engine::tsm1::error::TsmError;
    use crate::engine::tsm1::file_store::index::IndexEntries;
    use crate::engine::tsm1::file_store::reader::tsm_reader::{DefaultTSMReader, TSMReader};
    use crate::engine::tsm1::file_store::writer::tsm_writer::{DefaultTSMWriter, TSMWriter};
    use crate::engine::tsm1::file_store::{KeyRange, TimeRange};
    use crate::engine::tsm1::value::{Value, Values};

    #[test]
    fn test_time_range_overlaps() {
        let r = TimeRange::new(10, 20);
        assert!(r.overlaps(&TimeRange::new(20, 30)));
        assert!(!r.overlaps(&TimeRange::new(21, 30)));
        assert!(TimeRange::unbound().overlaps(&r));
    }

    #[test]
    fn test_key_range_overlaps() {
        let r = KeyRange::new("cpu", "mem");
        assert!(r.overlaps(b"disk", b"zzz"));
        assert!(!r.overlaps(b"net", b"zzz"));
    }

    #[tokio::test]
    async fn test_tsm_reader_read_all() {
        let dir = tempfile::tempdir().unwrap();
        let tsm_file = dir.path().join("tsm1_test");

        let cpu = Values::Float(vec![
            Value::new(1, 1.0),
            Value::new(2, 3.0),
            Value::new(3, 5.0),
            Value::new(4, 7.0),
        ]);
        let cpu_more = Values::Float(vec![Value::new(5, 9.0), Value::new(6, 11.0)]);
        let disk = Values::Integer(vec![Value::new(-3, -1), Value::new(10, 2)]);
        let mem = Values::String(vec![Value::new(7, b"free".to_vec())]);

        {
            let mut w = DefaultTSMWriter::new(&tsm_file).await.unwrap();
            w.write(b"cpu#!~#value", &cpu).await.unwrap();
            w.write(b"cpu#!~#value", &cpu_more).await.unwrap();
            w.write(b"disk#!~#used", &disk).await.unwrap();
            w.write(b"mem#!~#state", &mem).await.unwrap();
            w.write_index().await.unwrap();
            w.close().await.unwrap();
        }

        let f = MmapReadableFile::open(&tsm_file).await.unwrap();
        let r = DefaultTSMReader::new(f).await.unwrap();

        assert_eq!(r.key_count(), 3);
        assert_eq!(r.key_at(0), Some((&b"cpu#!~#value"[..], BLOCK_FLOAT64)));
        assert_eq!(r.key_at(1), Some((&b"disk#!~#used"[..], BLOCK_INTEGER)));
        assert_eq!(r.key_at(2), Some((&b"mem#!~#state"[..], BLOCK_STRING)));
        assert_eq!(r.key_at(3), None);

        assert!(r.contains(b"disk#!~#used"));
        assert!(!r.contains(b"disk#!~#free"));
        assert_eq!(r.block_type(b"mem#!~#state").unwrap(), BLOCK_STRING);
        assert!(r.block_type(b"nope").is_err());

        assert_eq!(r.time_range(), TimeRange::new(-3, 10));
        assert_eq!(r.key_range(), KeyRange::new("cpu#!~#value", "mem#!~#state"));

        let mut entries = IndexEntries::default();
        r.read_entries(b"cpu#!~#value", &mut entries).unwrap();
        assert_eq!(entries.typ, BLOCK_FLOAT64);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.entries[0].offset, 5);

        let mut expected = cpu.clone();
        if let (Values::Float(a), Values::Float(b)) = (&mut expected, &cpu_more) {
            a.extend_from_slice(b);
        }
        assert_eq!(r.read_all(b"cpu#!~#value").await.unwrap(), expected);
        assert_eq!(r.read_all(b"disk#!~#used").await.unwrap(), disk);
        assert_eq!(r.read_all(b"mem#!~#state").await.unwrap(), mem);

        let err = r.read_all(b"missing").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<TsmError>(),
            Some(&TsmError::KeyNotFound("missing".to_string()))
        );

        r.close().await.unwrap();
    }
}
