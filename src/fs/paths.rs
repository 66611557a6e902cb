//! Path and directory management.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::naming::sanitize_filename;

/// Resolve a client-supplied filename inside the download directory.
///
/// The name is sanitized first, so the result never escapes `dir`.
pub fn resolve_in_dir(dir: &Path, name: &str) -> Result<PathBuf> {
    let name = sanitize_filename(name)?;
    Ok(dir.join(name))
}

/// Ensure a directory exists, creating it if necessary.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}
