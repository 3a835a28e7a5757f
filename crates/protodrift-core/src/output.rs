//! Writing rendered documents to disk.

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Extension appended to each module's document by default
pub const DEFAULT_EXTENSION: &str = "proto.extracted";

/// Destination of a module's document: `<dir>/<module>.<extension>`
pub fn output_path(dir: &Path, module: &str, extension: &str) -> PathBuf {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        dir.join(module)
    } else {
        dir.join(format!("{}.{}", module, extension))
    }
}

/// Writes one module's document, creating the directory as needed
pub fn write_document(
    dir: &Path,
    module: &str,
    extension: &str,
    content: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| Error::directory_create(dir, e))?;

    let path = output_path(dir, module, extension);
    trace!("Writing {} bytes to {}", content.len(), path.display());

    let mut file = fs::File::create(&path).map_err(|e| Error::file_write(module, &path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::file_write(module, &path, e))?;

    Ok(path)
}
