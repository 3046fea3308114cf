//! Shared helpers for unit tests.

use std::path::PathBuf;
use tempfile::TempDir;

pub fn create_test_notes_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}
