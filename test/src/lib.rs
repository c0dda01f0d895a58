//! Shared C-minus programs for tests across the workspace.
//!
//! The programs live in `resources/test` at the workspace root so that the
//! parser, analyzer, code generator and CLI tests exercise the same sources.
use std::{fs, path::PathBuf};

/// Reads the shared program with the file name.
pub fn read_shared_resource(name: &'static str) -> String {
    fs::read_to_string(shared_resource_path(name))
        .unwrap_or_else(|e| panic!("Unable to read shared program {name}: {e}"))
}

/// Returns the path of the shared program with the file name.
pub fn shared_resource_path(name: &'static str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("..");
    path.push("resources");
    path.push("test");
    path.push(name);
    path
}
