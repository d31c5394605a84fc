//! File size queries backed by `std::fs` metadata.
//!
//! Provides:
//! - [`get_open_file_size`]  — byte length of an already-open [`std::fs::File`]
//! - [`get_file_size`]       — byte length of a file at a given path
//! - [`existing_file_len`]   — `Option<u64>` distinguishing "absent" from "empty"
//!
//! Non-regular files (directories, pipes, sockets) and unreachable paths
//! contribute `0` from [`get_file_size`]/[`get_open_file_size`], avoiding error
//! propagation through the reader's size-probing code.

use std::fs::{self, File};
use std::path::Path;

/// Returns the size in bytes of the open file `file`.
///
/// Returns `0` if `file` does not refer to a regular file (e.g. stdin, a pipe,
/// or a directory). Use [`get_file_size`] when only a path is available.
pub fn get_open_file_size(file: &File) -> u64 {
    file.metadata()
        .ok()
        .filter(|m| m.file_type().is_file())
        .map(|m| m.len())
        .unwrap_or(0)
}

/// Returns the size in bytes of the regular file at `path`.
///
/// Returns `0` if the path does not exist, is not a regular file, or cannot
/// be stat-ted. This makes the function safe to use in accumulation loops
/// without requiring callers to handle per-file errors.
pub fn get_file_size(path: &Path) -> u64 {
    fs::metadata(path)
        .ok()
        .filter(|m| m.file_type().is_file())
        .map(|m| m.len())
        .unwrap_or(0)
}

/// Returns `Some(len)` if `path` refers to an existing regular file, `None`
/// if it does not exist. Unlike [`get_file_size`], existence is distinguished
/// from a zero-length file — this is what the rollback descriptor needs to
/// tell "restore to empty" apart from "remove entirely".
pub fn existing_file_len(path: &Path) -> Option<u64> {
    match fs::metadata(path) {
        Ok(m) if m.file_type().is_file() => Some(m.len()),
        Ok(_) => None,
        Err(_) => None,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
