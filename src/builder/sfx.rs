//! SFX stub module and configuration template staging

use super::defaults::{CONFIG_FILE, SFX_SOURCE_DIR};
use crate::exceptions::{Result, SfxError};
use crate::install::InstallationLocator;
use crate::workspace::{TempWorkspace, attributes::clear_readonly};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The fixed set of SFX module variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SfxVariant {
    /// Windowed extractor (`7z.sfx`)
    GuiMode,
    /// Console extractor (`7zCon.sfx`)
    CmdMode,
    /// Small installer module (`7zS2.sfx`)
    Installer,
    /// Configurable installer module (`7zSD.sfx`)
    Custom,
}

impl SfxVariant {
    pub const ALL: [SfxVariant; 4] = [
        SfxVariant::GuiMode,
        SfxVariant::CmdMode,
        SfxVariant::Installer,
        SfxVariant::Custom,
    ];

    /// Canonical variant name
    pub fn name(self) -> &'static str {
        match self {
            SfxVariant::GuiMode => "GUI-Mode",
            SfxVariant::CmdMode => "CMD-Mode",
            SfxVariant::Installer => "Installer",
            SfxVariant::Custom => "Custom",
        }
    }

    /// File name of the stub module
    pub fn stub_file(self) -> &'static str {
        match self {
            SfxVariant::GuiMode => "7z.sfx",
            SfxVariant::CmdMode => "7zCon.sfx",
            SfxVariant::Installer => "7zS2.sfx",
            SfxVariant::Custom => "7zSD.sfx",
        }
    }

    /// File name of the configuration template
    pub fn config_template(self) -> &'static str {
        match self {
            SfxVariant::GuiMode => "config_gui.txt",
            SfxVariant::CmdMode => "config_cmd.txt",
            SfxVariant::Installer => "config_installer.txt",
            SfxVariant::Custom => "config_custom.txt",
        }
    }
}

impl fmt::Display for SfxVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SfxVariant {
    type Err = SfxError;

    fn from_str(s: &str) -> Result<Self> {
        SfxVariant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                SfxError::invalid_argument(format!(
                    "Unknown SFX variant '{s}' (expected one of GUI-Mode, CMD-Mode, Installer, Custom)"
                ))
            })
    }
}

impl TryFrom<String> for SfxVariant {
    type Error = SfxError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SfxVariant> for String {
    fn from(value: SfxVariant) -> Self {
        value.name().to_string()
    }
}

/// Copy the variant's stub module into the workspace under its own name
pub fn prepare_sfx(
    variant: SfxVariant,
    locator: &InstallationLocator,
) -> Result<(String, PathBuf)> {
    let root = locator.resolve_root()?;
    let workspace = TempWorkspace::new(&root);
    let dest = workspace.require()?.join(variant.stub_file());
    let source = root.join(SFX_SOURCE_DIR).join(variant.stub_file());

    stage_file(&source, &dest)?;
    info!("🧩 Staged SFX module {} ({variant})", variant.stub_file());
    Ok((
        format!("SFX module {} staged for {variant}", variant.stub_file()),
        dest,
    ))
}

/// Copy the variant's config template into the workspace as `config.txt`
///
/// The template is copied verbatim.
// TODO: substitute release placeholders (title, extract path) once the template syntax is fixed
pub fn prepare_cfg(
    variant: SfxVariant,
    locator: &InstallationLocator,
) -> Result<(String, PathBuf)> {
    let root = locator.resolve_root()?;
    let workspace = TempWorkspace::new(&root);
    let dest = workspace.require()?.join(CONFIG_FILE);
    let source = root.join(SFX_SOURCE_DIR).join(variant.config_template());

    stage_file(&source, &dest)?;
    info!(
        "📝 Staged config template {} as {CONFIG_FILE} ({variant})",
        variant.config_template()
    );
    Ok((
        format!(
            "Config template {} staged as {CONFIG_FILE} for {variant}",
            variant.config_template()
        ),
        dest,
    ))
}

fn stage_file(source: &Path, dest: &Path) -> Result<()> {
    if !source.is_file() {
        return Err(SfxError::missing(format!(
            "Source file not found: {}",
            source.display()
        )));
    }
    if dest.is_file() {
        clear_readonly(dest)?;
    }
    fs::copy(source, dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::{INSTALL_KEY, INSTALL_NAMESPACE, MemoryStore};
    use tempfile::TempDir;

    fn install_with_sources() -> (TempDir, PathBuf, InstallationLocator) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        let sfx_dir = root.join(SFX_SOURCE_DIR);
        fs::create_dir_all(&sfx_dir).unwrap();
        for variant in SfxVariant::ALL {
            fs::write(sfx_dir.join(variant.stub_file()), variant.stub_file()).unwrap();
            fs::write(sfx_dir.join(variant.config_template()), variant.name()).unwrap();
        }
        let locator = InstallationLocator::new(Box::new(MemoryStore::new().with(
            INSTALL_NAMESPACE,
            INSTALL_KEY,
            &*root.to_string_lossy(),
        )));
        (temp_dir, root, locator)
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("gui-mode".parse::<SfxVariant>().unwrap(), SfxVariant::GuiMode);
        assert_eq!("CMD-MODE".parse::<SfxVariant>().unwrap(), SfxVariant::CmdMode);
        assert_eq!("installer".parse::<SfxVariant>().unwrap(), SfxVariant::Installer);
        assert!("portable".parse::<SfxVariant>().is_err());
    }

    #[test]
    fn test_serde_uses_variant_names() {
        let json = serde_json::to_string(&SfxVariant::Custom).unwrap();
        assert_eq!(json, "\"Custom\"");
        let parsed: SfxVariant = serde_json::from_str("\"cmd-mode\"").unwrap();
        assert_eq!(parsed, SfxVariant::CmdMode);
    }

    #[test]
    fn test_prepare_sfx_keeps_stub_name() {
        let (_temp_dir, root, locator) = install_with_sources();
        TempWorkspace::new(&root).create().unwrap();

        let (_, dest) = prepare_sfx(SfxVariant::Installer, &locator).unwrap();
        assert_eq!(dest, root.join("tmpdata/7zS2.sfx"));
        assert_eq!(fs::read_to_string(dest).unwrap(), "7zS2.sfx");
    }

    #[test]
    fn test_prepare_cfg_renames_and_overwrites() {
        let (_temp_dir, root, locator) = install_with_sources();
        let workspace = TempWorkspace::new(&root);
        workspace.create().unwrap();
        fs::write(workspace.join(CONFIG_FILE), "stale").unwrap();

        let (_, dest) = prepare_cfg(SfxVariant::CmdMode, &locator).unwrap();
        assert_eq!(dest, workspace.join("config.txt"));
        assert_eq!(fs::read_to_string(dest).unwrap(), "CMD-Mode");
    }

    #[test]
    fn test_requires_existing_workspace() {
        let (_temp_dir, root, locator) = install_with_sources();

        let err = prepare_sfx(SfxVariant::GuiMode, &locator).unwrap_err();
        assert!(matches!(err, SfxError::Precondition(_)));
        assert!(!root.join("tmpdata").exists());
    }

    #[test]
    fn test_missing_source_fails() {
        let (_temp_dir, root, locator) = install_with_sources();
        TempWorkspace::new(&root).create().unwrap();
        fs::remove_file(root.join(SFX_SOURCE_DIR).join("config_custom.txt")).unwrap();

        let err = prepare_cfg(SfxVariant::Custom, &locator).unwrap_err();
        assert!(matches!(err, SfxError::MissingDependency(_)));
    }
}
