//! Inspection tools over TSM files.

pub mod config;
pub mod error;
pub mod export;
