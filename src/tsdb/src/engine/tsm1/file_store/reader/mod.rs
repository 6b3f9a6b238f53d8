pub mod block_reader;
pub mod index_reader;
pub mod tsm_reader;
