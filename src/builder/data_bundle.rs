//! Raw payload staging into the workspace

use crate::exceptions::{Result, SfxError};
use crate::utils::{count_entries, dir_has_entries};
use crate::workspace::attributes::clear_readonly;
use anyhow::Context;
use log::{debug, info, trace, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Copy the contents of `source` (not `source` itself) into `dest`
///
/// `source` must be a non-empty directory and `dest` must not lie inside it.
/// `dest` is created when missing and conflicting files are overwritten.
/// Directory symlinks below `source` are skipped.
pub fn prepare_data_bundle(source: &Path, dest: &Path) -> Result<(String, PathBuf)> {
    if source.as_os_str().is_empty() || dest.as_os_str().is_empty() {
        return Err(SfxError::precondition(
            "Source and destination directories are required",
        ));
    }
    if !source.exists() {
        return Err(SfxError::precondition(format!(
            "Source directory not found: {}",
            source.display()
        )));
    }
    if !source.is_dir() {
        return Err(SfxError::precondition(format!(
            "Source is not a directory: {}",
            source.display()
        )));
    }
    if !dir_has_entries(source)? {
        return Err(SfxError::precondition(format!(
            "Source directory is empty: {}",
            source.display()
        )));
    }

    let source_root = fs::canonicalize(source)?;
    let dest_root = resolve_existing_prefix(dest)?;
    if dest_root.starts_with(&source_root) {
        return Err(SfxError::precondition(format!(
            "Destination {} is inside the source directory {}",
            dest.display(),
            source.display()
        )));
    }

    if !dest.exists() {
        debug!("📁 Creating destination directory: {}", dest.display());
        fs::create_dir_all(dest)?;
    }

    info!(
        "📦 Staging data bundle {} -> {}",
        source.display(),
        dest.display()
    );
    copy_contents(source, dest)?;

    if !dir_has_entries(dest)? {
        return Err(SfxError::postcondition(format!(
            "Destination is empty after copy: {}",
            dest.display()
        )));
    }

    let copied = count_entries(source)?;
    Ok((
        format!("Data bundle staged: {copied} items copied to {}", dest.display()),
        dest.to_path_buf(),
    ))
}

/// Canonicalize the longest existing ancestor of `path` and re-append the rest
fn resolve_existing_prefix(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }

    let mut resolved = fs::canonicalize(existing)?;
    resolved.extend(rest.iter().rev());
    Ok(resolved)
}

/// Recursively copy the children of `src` into `dst`
fn copy_contents(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)
        .with_context(|| format!("Failed to create {}", dst.display()))?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            copy_contents(&src_path, &dst_path)?;
        } else if file_type.is_symlink() && src_path.is_dir() {
            warn!("⚠️ Skipping directory symlink {}", src_path.display());
        } else {
            if dst_path.is_file() {
                clear_readonly(&dst_path)?;
            }
            fs::copy(&src_path, &dst_path).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    src_path.display(),
                    dst_path.display()
                )
            })?;
            trace!("📄 {:?} -> {:?}", src_path, dst_path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copies_contents_not_directory() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app");
        fs::create_dir_all(source.join("bin")).unwrap();
        fs::write(source.join("bin/app.exe"), b"MZ").unwrap();
        fs::write(source.join("readme.txt"), "hello").unwrap();
        let dest = temp_dir.path().join("stage");

        let (message, staged) = prepare_data_bundle(&source, &dest).unwrap();
        assert_eq!(staged, dest);
        assert!(message.contains("3 items"));
        assert!(dest.join("bin/app.exe").is_file());
        assert!(dest.join("readme.txt").is_file());
        assert!(!dest.join("app").exists());
        assert!(count_entries(&dest).unwrap() > 0);
    }

    #[test]
    fn test_overwrites_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dst");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(source.join("a.txt"), "new").unwrap();
        fs::write(dest.join("a.txt"), "old").unwrap();

        prepare_data_bundle(&source, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "new");
    }

    #[test]
    fn test_empty_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("empty");
        fs::create_dir(&source).unwrap();

        let err = prepare_data_bundle(&source, &temp_dir.path().join("dst")).unwrap_err();
        assert!(matches!(err, SfxError::Precondition(_)));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_destination_inside_source_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("install");
        fs::create_dir_all(root.join("tmpdata")).unwrap();
        fs::write(root.join("setup.ini"), "x").unwrap();
        let dest = root.join("tmpdata/payload");

        let err = prepare_data_bundle(&root, &dest).unwrap_err();
        assert!(matches!(err, SfxError::Precondition(_)));
        assert!(err.to_string().contains("inside the source"));
        assert!(!dest.exists());

        // The source itself as destination
        assert!(prepare_data_bundle(&root, &root).is_err());
    }

    #[test]
    fn test_destination_beside_source_with_shared_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.txt"), "a").unwrap();

        let dest = temp_dir.path().join("app-stage");
        prepare_data_bundle(&source, &dest).unwrap();
        assert!(dest.join("a.txt").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_symlink_loop_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("app");
        fs::create_dir_all(source.join("bin")).unwrap();
        fs::write(source.join("bin/app"), "elf").unwrap();
        std::os::unix::fs::symlink(&source, source.join("bin/loop")).unwrap();

        let dest = temp_dir.path().join("stage");
        prepare_data_bundle(&source, &dest).unwrap();
        assert!(dest.join("bin/app").is_file());
        assert!(!dest.join("bin/loop").exists());
    }

    #[test]
    fn test_missing_or_file_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("dst");
        assert!(prepare_data_bundle(&temp_dir.path().join("nope"), &dest).is_err());

        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(prepare_data_bundle(&file, &dest).is_err());
    }
}
