//! File attribute helpers for the scratch workspace
//!
//! Hidden and system attributes only exist on Windows. Elsewhere setting them
//! is a logged no-op; read-only handling works on every platform.

use crate::exceptions::Result;
use log::{debug, trace, warn};
use std::fs;
use std::path::Path;

/// Mark `path` hidden + system, keeping its other attributes
#[cfg(windows)]
#[allow(unsafe_code)] // Required for Windows API FFI calls
pub fn set_hidden_system(path: &Path) -> Result<()> {
    use crate::exceptions::SfxError;
    use windows::Win32::Storage::FileSystem::{
        FILE_ATTRIBUTE_HIDDEN, FILE_ATTRIBUTE_SYSTEM, FILE_FLAGS_AND_ATTRIBUTES,
        GetFileAttributesW, INVALID_FILE_ATTRIBUTES, SetFileAttributesW,
    };
    use windows::core::PCWSTR;

    let wide_path = to_wide(path);
    let current = unsafe { GetFileAttributesW(PCWSTR(wide_path.as_ptr())) };
    if current == INVALID_FILE_ATTRIBUTES {
        return Err(std::io::Error::last_os_error().into());
    }

    let wanted =
        FILE_FLAGS_AND_ATTRIBUTES(current) | FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM;
    unsafe { SetFileAttributesW(PCWSTR(wide_path.as_ptr()), wanted) }.map_err(|e| {
        SfxError::Generic(format!(
            "Failed to set hidden/system attributes on {}: {e}",
            path.display()
        ))
    })?;

    debug!("🙈 Marked hidden+system: {}", path.display());
    Ok(())
}

/// Mark `path` hidden + system (no-op outside Windows)
#[cfg(not(windows))]
pub fn set_hidden_system(path: &Path) -> Result<()> {
    debug!(
        "Hidden/system attributes not supported on this platform, skipping {}",
        path.display()
    );
    Ok(())
}

/// True when `path` carries both the hidden and system attributes
#[cfg(windows)]
#[allow(unsafe_code)] // Required for Windows API FFI calls
pub fn is_hidden_system(path: &Path) -> Result<bool> {
    use windows::Win32::Storage::FileSystem::{
        FILE_ATTRIBUTE_HIDDEN, FILE_ATTRIBUTE_SYSTEM, GetFileAttributesW, INVALID_FILE_ATTRIBUTES,
    };
    use windows::core::PCWSTR;

    let wide_path = to_wide(path);
    let current = unsafe { GetFileAttributesW(PCWSTR(wide_path.as_ptr())) };
    if current == INVALID_FILE_ATTRIBUTES {
        return Err(std::io::Error::last_os_error().into());
    }
    let wanted = FILE_ATTRIBUTE_HIDDEN.0 | FILE_ATTRIBUTE_SYSTEM.0;
    Ok(current & wanted == wanted)
}

/// True when `path` carries both the hidden and system attributes
#[cfg(not(windows))]
pub fn is_hidden_system(_path: &Path) -> Result<bool> {
    Ok(false)
}

#[cfg(windows)]
fn to_wide(path: &Path) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    path.as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Clear the read-only flag on a single entry
#[allow(clippy::permissions_set_readonly_false)]
pub fn clear_readonly(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.file_type().is_symlink() {
        return Ok(());
    }

    let mut perms = metadata.permissions();
    if !perms.readonly() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(perms.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        perms.set_readonly(false);
    }

    fs::set_permissions(path, perms)?;
    trace!("🔓 Cleared read-only flag: {}", path.display());
    Ok(())
}

/// Clear the read-only flag on `path` and everything below it
///
/// Keeps going after individual failures; returns how many entries could not
/// be updated.
pub fn clear_readonly_recursive(path: &Path) -> usize {
    let mut failures = 0;
    for entry in walkdir::WalkDir::new(path).follow_links(false) {
        let result = entry
            .map_err(Into::into)
            .and_then(|entry| clear_readonly(entry.path()));
        if let Err(e) = result {
            warn!("⚠️ Could not clear read-only flag below {}: {e}", path.display());
            failures += 1;
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clear_readonly_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a");
        fs::create_dir(&nested).unwrap();
        let file = nested.join("locked.txt");
        fs::write(&file, "x").unwrap();

        let mut perms = fs::metadata(&file).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&file, perms).unwrap();

        assert_eq!(clear_readonly_recursive(temp_dir.path()), 0);
        assert!(!fs::metadata(&file).unwrap().permissions().readonly());
    }

    #[cfg(windows)]
    #[test]
    fn test_set_hidden_system() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("tmpdata");
        fs::create_dir(&dir).unwrap();

        assert!(!is_hidden_system(&dir).unwrap());
        set_hidden_system(&dir).unwrap();
        assert!(is_hidden_system(&dir).unwrap());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_hidden_system_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        set_hidden_system(temp_dir.path()).unwrap();
        assert!(!is_hidden_system(temp_dir.path()).unwrap());
    }
}
