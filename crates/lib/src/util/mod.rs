//! Shared utilities.

pub mod search_path;

#[cfg(test)]
pub mod testutil;

pub use search_path::SearchPath;
