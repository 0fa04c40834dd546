//! Scratch workspace lifecycle

use super::attributes::{clear_readonly, clear_readonly_recursive, set_hidden_system};
use crate::exceptions::{Result, SfxError};
use crate::utils::dir_has_entries;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the scratch directory below the installation root
pub const WORKSPACE_DIR: &str = "tmpdata";

/// The hidden per-installation scratch directory, `{root}/tmpdata`
///
/// The workspace belongs to the installation root rather than to a caller.
/// Staging and assembly share it without locking, so only one build may be in
/// flight per installation root.
#[derive(Debug, Clone)]
pub struct TempWorkspace {
    path: PathBuf,
}

impl TempWorkspace {
    /// Workspace of the installation rooted at `install_root`
    pub fn new<P: AsRef<Path>>(install_root: P) -> Self {
        Self {
            path: install_root.as_ref().join(WORKSPACE_DIR),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Fail unless the workspace directory exists
    pub fn require(&self) -> Result<&Path> {
        if self.exists() {
            Ok(&self.path)
        } else {
            Err(SfxError::precondition(format!(
                "Scratch workspace not found: {} (create it first)",
                self.path.display()
            )))
        }
    }

    /// Path of `name` inside the workspace
    pub fn join<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        self.path.join(name)
    }

    /// Create the workspace if missing; always (re)assert hidden+system
    ///
    /// Existing contents are left untouched.
    pub fn create(&self) -> Result<(String, PathBuf)> {
        if self.path.exists() {
            if !self.path.is_dir() {
                return Err(SfxError::precondition(format!(
                    "Workspace path exists but is not a directory: {}",
                    self.path.display()
                )));
            }
            set_hidden_system(&self.path)?;
            debug!("📁 Workspace already present: {}", self.path.display());
            return Ok((
                format!("Workspace already exists: {}", self.path.display()),
                self.path.clone(),
            ));
        }

        fs::create_dir_all(&self.path)?;
        set_hidden_system(&self.path)?;
        info!("📁 Created workspace: {}", self.path.display());
        Ok((
            format!("Workspace created: {}", self.path.display()),
            self.path.clone(),
        ))
    }

    /// Remove every child of the workspace, keeping the directory itself
    ///
    /// Stops at the first child that cannot be removed.
    pub fn clean(&self) -> Result<(String, PathBuf)> {
        self.clean_with(remove_entry)
    }

    fn clean_with<F>(&self, mut remove: F) -> Result<(String, PathBuf)>
    where
        F: FnMut(&Path) -> Result<()>,
    {
        if !self.path.exists() {
            debug!("🧹 No workspace at {}, nothing to clean", self.path.display());
            return Ok((
                "Workspace does not exist, nothing to clean".to_string(),
                self.path.clone(),
            ));
        }

        let mut removed = 0usize;
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let child = entry.path();
            remove(&child).map_err(|e| {
                SfxError::Generic(format!("Failed to remove {}: {e}", child.display()))
            })?;
            removed += 1;
        }

        if dir_has_entries(&self.path)? {
            return Err(SfxError::postcondition(format!(
                "Cleanup incomplete: {} still has entries",
                self.path.display()
            )));
        }

        info!("🧹 Cleaned workspace ({removed} entries removed)");
        Ok((
            format!("Workspace cleaned: {removed} entries removed"),
            self.path.clone(),
        ))
    }

    /// Remove the workspace directory and everything in it
    pub fn destroy(&self) -> Result<(String, ())> {
        if !self.path.exists() {
            debug!("🗑️ No workspace at {}, nothing to remove", self.path.display());
            return Ok(("Workspace does not exist, nothing to remove".to_string(), ()));
        }

        let failures = clear_readonly_recursive(&self.path);
        if failures > 0 {
            warn!("⚠️ {failures} entries kept their read-only flag, removing anyway");
        }

        fs::remove_dir_all(&self.path)?;

        if self.path.exists() {
            return Err(SfxError::postcondition(format!(
                "Workspace still exists after removal: {}",
                self.path.display()
            )));
        }

        info!("🗑️ Removed workspace: {}", self.path.display());
        Ok((format!("Workspace removed: {}", self.path.display()), ()))
    }
}

/// Remove a file or directory tree, clearing read-only flags first
fn remove_entry(path: &Path) -> Result<()> {
    let file_type = fs::symlink_metadata(path)?.file_type();
    if file_type.is_dir() {
        clear_readonly_recursive(path);
        fs::remove_dir_all(path)?;
    } else {
        clear_readonly(path)?;
        fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = TempWorkspace::new(temp_dir.path());

        let (_, first) = workspace.create().unwrap();
        fs::write(first.join("keep.txt"), "data").unwrap();

        let (message, second) = workspace.create().unwrap();
        assert_eq!(first, second);
        assert!(message.contains("already exists"));
        assert_eq!(fs::read_to_string(second.join("keep.txt")).unwrap(), "data");
    }

    #[test]
    fn test_create_rejects_file_in_the_way() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(WORKSPACE_DIR), "not a dir").unwrap();

        let err = TempWorkspace::new(temp_dir.path()).create().unwrap_err();
        assert!(matches!(err, SfxError::Precondition(_)));
    }

    #[test]
    fn test_clean_empties_directory() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = TempWorkspace::new(temp_dir.path());
        workspace.create().unwrap();

        fs::write(workspace.join("App.7z"), "archive").unwrap();
        fs::write(workspace.join(".hidden"), "dot").unwrap();
        fs::create_dir_all(workspace.join("payload/nested")).unwrap();
        fs::write(workspace.join("payload/nested/file.bin"), [1u8, 2, 3]).unwrap();

        let readonly = workspace.join("config.txt");
        fs::write(&readonly, "cfg").unwrap();
        let mut perms = fs::metadata(&readonly).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&readonly, perms).unwrap();

        let (message, path) = workspace.clean().unwrap();
        assert!(message.contains("4 entries"));
        assert!(path.is_dir());
        assert_eq!(fs::read_dir(&path).unwrap().count(), 0);
    }

    fn populated(temp_dir: &TempDir) -> TempWorkspace {
        let workspace = TempWorkspace::new(temp_dir.path());
        workspace.create().unwrap();
        fs::write(workspace.join("7z.sfx"), "stub").unwrap();
        fs::write(workspace.join("config.txt"), "cfg").unwrap();
        fs::write(workspace.join("App.7z"), "archive").unwrap();
        workspace
    }

    #[test]
    fn test_clean_stops_at_first_failure() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = populated(&temp_dir);

        let mut attempts = Vec::new();
        let err = workspace
            .clean_with(|path| {
                attempts.push(path.to_path_buf());
                Err(SfxError::from(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "in use by another process",
                )))
            })
            .unwrap_err();

        assert_eq!(attempts.len(), 1);
        let message = err.to_string();
        assert!(message.contains(&*attempts[0].display().to_string()));
        assert!(message.contains("in use by another process"));
        assert_eq!(fs::read_dir(workspace.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_clean_reports_leftover_entries() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = populated(&temp_dir);

        let err = workspace.clean_with(|_| Ok(())).unwrap_err();
        assert_eq!(err.kind(), crate::exceptions::ErrorKind::Postcondition);
        assert!(err.to_string().contains("Cleanup incomplete"));
    }

    #[test]
    fn test_clean_absent_workspace_does_not_create_it() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = TempWorkspace::new(temp_dir.path());

        assert!(workspace.clean().is_ok());
        assert!(!workspace.path().exists());
    }

    #[test]
    fn test_destroy_removes_directory() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = TempWorkspace::new(temp_dir.path());
        workspace.create().unwrap();
        fs::create_dir(workspace.join("sub")).unwrap();
        fs::write(workspace.join("sub/file"), "x").unwrap();

        workspace.destroy().unwrap();
        assert!(!workspace.path().exists());

        // Absent workspace is a no-op success
        assert!(workspace.destroy().is_ok());
    }

    #[test]
    fn test_destroy_read_only_tree() {
        let temp_dir = TempDir::new().unwrap();
        let workspace = TempWorkspace::new(temp_dir.path());
        workspace.create().unwrap();
        let nested = workspace.join("payload/bin");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("app.dll"), "dll").unwrap();
        fs::write(workspace.join("config.txt"), "cfg").unwrap();

        for file in [nested.join("app.dll"), workspace.join("config.txt")] {
            let mut perms = fs::metadata(&file).unwrap().permissions();
            perms.set_readonly(true);
            fs::set_permissions(&file, perms).unwrap();
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            for dir in [nested.clone(), workspace.join("payload")] {
                fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();
            }
        }

        workspace.destroy().unwrap();
        assert!(!workspace.path().exists());
    }

    #[test]
    fn test_require_missing_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let err = TempWorkspace::new(temp_dir.path()).require().unwrap_err();
        assert!(err.to_string().contains("create it first"));
    }
}
