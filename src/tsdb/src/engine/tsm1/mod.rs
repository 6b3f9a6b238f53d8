pub mod block;
pub mod codec;
pub mod error;
pub mod file_store;
pub mod value;
