//! Shared fixtures for the `stepbind` test suites.
//!
//! Sample binding types record what happens to them in a per-thread
//! [`ledger`], so tests can assert on activation and teardown order without
//! global state leaking between parallel test threads.

pub mod bindings;
pub mod error;
pub mod ledger;

pub use error::display_error_chain;

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write `contents` to a `stepbind.toml` inside a fresh temporary directory.
///
/// Returns the directory guard and the path to the file.
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("stepbind.toml");
    fs::write(&path, contents).expect("write config");
    (dir, path)
}
