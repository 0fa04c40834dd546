//! Utility functions for sfxkit

use crate::exceptions::Result;
use std::env;
use std::path::{Path, PathBuf};

/// Check if an environment variable is set to a truthy value
/// Accepts: "1", "true", "on", "yes", "t" (case insensitive)
pub fn is_env_true(key: &str) -> bool {
    match env::var(key) {
        Ok(val) => is_truthy(&val),
        Err(_) => false,
    }
}

fn is_truthy(val: &str) -> bool {
    let val_lower = val.to_lowercase();
    matches!(val_lower.as_str(), "1" | "true" | "on" | "yes" | "t")
}

/// Get the per-user configuration directory for sfxkit
///
/// Follows XDG on Unix-like systems and `%APPDATA%` on Windows.
pub fn get_config_dir() -> PathBuf {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg_config).join("sfxkit");
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(app_data) = env::var("APPDATA") {
            return PathBuf::from(app_data).join("sfxkit");
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".config/sfxkit");
    }

    env::temp_dir().join("sfxkit")
}

/// Render a byte count for status messages, e.g. "1.50 MB (1572864 bytes)"
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} bytes");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {} ({bytes} bytes)", UNITS[unit])
}

/// Canonicalize `path` into a form fit for messages and reports
///
/// On Windows `fs::canonicalize` yields verbatim paths (`\\?\C:\...`); the
/// prefix is dropped again when the plain form stays within `MAX_PATH`.
pub fn canonical_path(path: &Path) -> Result<PathBuf> {
    let canonical = std::fs::canonicalize(path)?;
    Ok(strip_verbatim(canonical))
}

#[cfg(windows)]
fn strip_verbatim(path: PathBuf) -> PathBuf {
    use std::path::{Component, Prefix};

    const MAX_PATH: usize = 260;

    let mut components = path.components();
    let root = match components.next() {
        Some(Component::Prefix(prefix)) => match prefix.kind() {
            Prefix::VerbatimDisk(drive) => format!("{}:\\", drive as char),
            Prefix::VerbatimUNC(server, share) => format!(
                "\\\\{}\\{}\\",
                server.to_string_lossy(),
                share.to_string_lossy()
            ),
            _ => return path,
        },
        _ => return path,
    };

    let mut plain = PathBuf::from(root);
    for component in components {
        match component {
            Component::RootDir => {}
            Component::Normal(name) => plain.push(name),
            _ => return path,
        }
    }

    if plain.as_os_str().len() < MAX_PATH {
        plain
    } else {
        path
    }
}

#[cfg(not(windows))]
fn strip_verbatim(path: PathBuf) -> PathBuf {
    path
}

/// Count files and directories below `dir`, excluding `dir` itself
pub fn count_entries(dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in walkdir::WalkDir::new(dir).min_depth(1) {
        entry?;
        count += 1;
    }
    Ok(count)
}

/// True when `dir` has at least one child entry
pub fn dir_has_entries(dir: &Path) -> Result<bool> {
    Ok(std::fs::read_dir(dir)?.next().is_some())
}
