//! Installation root resolution

use super::stores::{LocationStore, default_store};
use crate::exceptions::{Result, SfxError};
use crate::status::StatusResult;
use log::{debug, trace};
use std::path::PathBuf;

/// Namespace holding the installation location
pub const INSTALL_NAMESPACE: &str = "SOFTWARE\\sfxkit";

/// Key of the installation location value
pub const INSTALL_KEY: &str = "InstallLocation";

/// Resolves the toolset installation root from a [`LocationStore`]
///
/// Nothing is cached: every call reads the store again, so moving the
/// installation mid-session is picked up by the next operation.
#[derive(Debug)]
pub struct InstallationLocator {
    store: Box<dyn LocationStore>,
}

impl InstallationLocator {
    pub fn new(store: Box<dyn LocationStore>) -> Self {
        Self { store }
    }

    /// Locator backed by the platform default store chain
    pub fn system() -> Self {
        Self::new(default_store())
    }

    /// Resolve the installation root, checking it is an existing directory
    pub fn resolve_root(&self) -> Result<PathBuf> {
        trace!(
            "🔍 Looking up {INSTALL_NAMESPACE}\\{INSTALL_KEY} in {}",
            self.store.describe()
        );

        let value = self
            .store
            .lookup(INSTALL_NAMESPACE, INSTALL_KEY)?
            .ok_or_else(|| {
                SfxError::missing(format!(
                    "Installation location {INSTALL_NAMESPACE}\\{INSTALL_KEY} is not registered ({})",
                    self.store.describe()
                ))
            })?;

        let value = value.trim();
        if value.is_empty() {
            return Err(SfxError::missing(format!(
                "Installation location {INSTALL_NAMESPACE}\\{INSTALL_KEY} is empty"
            )));
        }

        let root = PathBuf::from(value);
        if !root.is_dir() {
            return Err(SfxError::missing(format!(
                "Installation directory not found: {}",
                root.display()
            )));
        }

        debug!("📁 Installation root: {}", root.display());
        Ok(root)
    }

    /// Resolve the installation root as a status result
    pub fn resolve(&self) -> StatusResult<PathBuf> {
        StatusResult::from_result(
            self.resolve_root()
                .map(|root| (format!("Installation root: {}", root.display()), root)),
        )
    }
}
