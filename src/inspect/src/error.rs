use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The storage file could not be opened at all.
    #[error("open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Writing the export stream failed.
    #[error("write export: {0}")]
    Write(#[from] io::Error),

    /// Values of a block type that has no line protocol rendering.
    #[error("unsupported block type {block_type} for key {key:?}")]
    UnsupportedBlockType { key: String, block_type: u8 },
}
