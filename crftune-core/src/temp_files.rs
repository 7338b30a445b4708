//! Temporary file management utilities.
//!
//! Helpers for creating temporary files and directories through the tempfile
//! crate, which removes them on drop, including on error paths.

use crate::error::CoreResult;
use std::path::Path;
use tempfile::{Builder as TempFileBuilder, NamedTempFile, TempDir};

/// Creates a temporary directory with prefix under `base`. Auto-cleaned when dropped.
pub fn create_temp_dir(base: &Path, prefix: &str) -> CoreResult<TempDir> {
    std::fs::create_dir_all(base)?;

    Ok(TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .tempdir_in(base)?)
}

/// Creates a temporary file with prefix and extension. Auto-deleted when dropped.
pub fn create_temp_file(dir: &Path, prefix: &str, extension: &str) -> CoreResult<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    let temp_file = TempFileBuilder::new()
        .prefix(&format!("{prefix}_"))
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)?;

    Ok(temp_file)
}
