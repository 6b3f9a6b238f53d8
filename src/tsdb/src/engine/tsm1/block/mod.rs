//! A block holds the points of one key, timestamps and values encoded separately:
//!
//! ┌──────────┬──────────────────────┬────────────┬──────────┐
//! │   Type   │ Len(timestamps)      │ Timestamps │  Values  │
//! │  1 byte  │ uvarint              │  N bytes   │ N bytes  │
//! └──────────┴──────────────────────┴────────────┴──────────┘

pub mod decoder;
pub mod encoder;

/// BLOCK_FLOAT64 designates a block encodes float64 values.
pub const BLOCK_FLOAT64: u8 = 0;

/// BLOCK_INTEGER designates a block encodes int64 values.
pub const BLOCK_INTEGER: u8 = 1;

/// BLOCK_BOOLEAN designates a block encodes boolean values.
pub const BLOCK_BOOLEAN: u8 = 2;

/// BLOCK_STRING designates a block encodes string values.
pub const BLOCK_STRING: u8 = 3;

/// BLOCK_UNSIGNED designates a block encodes uint64 values.
pub const BLOCK_UNSIGNED: u8 = 4;

/// ENCODED_BLOCK_HEADER_SIZE is the size of the header for an encoded block.  There is one
/// byte encoding the type of the block.
pub const ENCODED_BLOCK_HEADER_SIZE: usize = 1;

/// DEFAULT_MAX_POINTS_PER_BLOCK is the number of points a full block usually holds.
pub const DEFAULT_MAX_POINTS_PER_BLOCK: usize = 1000;
