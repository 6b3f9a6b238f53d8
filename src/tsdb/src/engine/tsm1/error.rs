use thiserror::Error;

/// Conditions raised by the TSM writer and reader that callers may want to match on.
/// They travel inside `anyhow::Error` and can be recovered with `downcast_ref`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TsmError {
    /// returned when writing an index with no keys.
    #[error("no values written")]
    NoValues,

    #[error("max key length exceeded: {0} bytes")]
    MaxKeyLengthExceeded(usize),

    #[error("max blocks exceeded for key")]
    MaxBlocksExceeded,

    /// keys must be added to the index in ascending order.
    #[error("key {key:?} is not greater than previous key {prev:?}")]
    UnsortedKey { key: String, prev: String },

    #[error("key {0:?} not found")]
    KeyNotFound(String),

    #[error("block checksum mismatch at offset {offset}: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        offset: u64,
        stored: u32,
        computed: u32,
    },

    #[error("block at offset {offset} with size {size} exceeds data section end {max}")]
    BlockOutOfRange { offset: u64, size: u32, max: u64 },
}
