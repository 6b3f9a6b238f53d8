#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate async_trait;

pub mod engine;

