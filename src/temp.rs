//! Scratch space for downloaded installers
//!
//! The scratch directory is never created under the current working
//! directory (e.g. when TMPDIR=tmp or TMPDIR=./tmp) and is removed when the
//! returned handle is dropped, on success and on failure alike.

use std::env;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::error::{FalconError, Result};

/// Returns an absolute directory suitable for creating temporary directories.
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        PathBuf::from("/tmp")
    }
}

/// Create a private scratch directory for one installer run.
pub fn scratch_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("falcon-sensor-")
        .tempdir_in(temp_dir_base())
        .map_err(|e| FalconError::IoError {
            message: format!("Failed to create scratch directory: {e}"),
        })
}
