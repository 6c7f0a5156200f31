//! Path Utilities
//!
//! Upward file discovery for workspace and package metadata.

use std::path::{Path, PathBuf};

/// Walk from `start` towards the filesystem root and return the first
/// directory containing `file_name`.
pub fn find_upwards(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(file_name).is_file())
        .map(Path::to_path_buf)
}
