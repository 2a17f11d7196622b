//! Test fixtures for pipeline tests
//!
//! Descriptor files live next to this module; project trees are built in
//! temporary directories so alias directories can be created or omitted.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Alias directories the built-in descriptor expects
pub const BUILTIN_ALIAS_DIRS: &[&str] = &["src/components", "src/utils", "src/assets"];

/// Path to a descriptor fixture
pub fn descriptor_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Temporary project with the built-in alias directories and, optionally,
/// a descriptor fixture copied in as `bundle-plan.toml`
pub fn project(descriptor: Option<&str>) -> TempDir {
    let tmp = TempDir::new().expect("tmp");
    for dir in BUILTIN_ALIAS_DIRS {
        fs::create_dir_all(tmp.path().join(dir)).expect("mkdir");
    }
    if let Some(name) = descriptor {
        fs::copy(descriptor_path(name), tmp.path().join("bundle-plan.toml")).expect("copy fixture");
    }
    tmp
}
