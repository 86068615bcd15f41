//! CLI integration tests: full builds against throwaway scripts trees.

mod build_tests;
mod common;
