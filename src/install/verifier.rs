//! Checks that an external executable is present before it is invoked

use crate::exceptions::{Result, SfxError};
use crate::utils::canonical_path;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension accepted as an executable on every platform
pub const EXECUTABLE_EXTENSION: &str = "exe";

/// Canonicalize `path` and confirm it names an executable regular file
///
/// `.exe` files are accepted everywhere. On Unix an extensionless file with an
/// execute bit counts as the equivalent.
pub fn verify_binary(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(SfxError::precondition("Executable path is empty"));
    }
    if !path.exists() {
        return Err(SfxError::missing(format!(
            "Executable not found: {}",
            path.display()
        )));
    }

    let resolved = canonical_path(path)?;
    let metadata = fs::metadata(&resolved)?;
    if metadata.is_dir() {
        return Err(SfxError::precondition(format!(
            "Expected an executable file but found a directory: {}",
            resolved.display()
        )));
    }
    if !metadata.is_file() {
        return Err(SfxError::precondition(format!(
            "Not a regular file: {}",
            resolved.display()
        )));
    }

    if !has_executable_form(&resolved, &metadata) {
        return Err(SfxError::precondition(format!(
            "Not an executable (.{EXECUTABLE_EXTENSION}) file: {}",
            resolved.display()
        )));
    }

    debug!("✅ Verified executable: {}", resolved.display());
    Ok(resolved)
}

fn has_executable_form(path: &Path, metadata: &fs::Metadata) -> bool {
    match path.extension() {
        Some(ext) => ext.eq_ignore_ascii_case(EXECUTABLE_EXTENSION),
        None => is_executable_mode(metadata),
    }
}

#[cfg(unix)]
fn is_executable_mode(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable_mode(_metadata: &fs::Metadata) -> bool {
    false
}
