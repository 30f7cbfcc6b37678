//! CLI command implementations.

pub mod build;
pub mod config;
pub mod host;
pub mod parsers;
